use std::io::{Error, ErrorKind, Result};
use dotenv::dotenv;
use verify_email::settings::get_settings;
use verify_email::startup::Application;
use verify_email::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let settings = get_settings()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Failed to read settings: {}", e)))?;

    let subscriber = get_subscriber(settings.debug);
    init_subscriber(subscriber)
        .map_err(|e| Error::new(ErrorKind::Other, format!("Failed to set subscriber: {}", e)))?;

    let application = Application::build(settings, None).await?;

    tracing::event!(target: "verify_email", tracing::Level::INFO, "Listening on http://127.0.0.1:{}/",
        application.port());

    application.run_until_stopped().await?;
    Ok(())
}
