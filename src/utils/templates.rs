use std::path::Path;
use minijinja::{path_loader, Environment};
use serde::Serialize;

/// Named HTML templates, loaded lazily from a directory.
#[derive(Clone)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn from_directory(directory: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(directory.as_ref().to_path_buf()));
        Self { env }
    }

    /// Fails when the template does not exist or does not render.
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}
