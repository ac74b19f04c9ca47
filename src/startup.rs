use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use std::time::Duration;
use actix_web::{App, HttpServer};
use actix_web::dev::Server;
use actix_web::web::{get, Data};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use crate::routes::{health_check, verification_routes_config};
use crate::settings::{DatabaseSettings, Settings};
use crate::store::PgUserStore;
use crate::utils::{SmtpMailer, Templates};
use crate::verification::EmailVerification;

/// Directory the email and result-page templates are loaded from.
const TEMPLATE_DIRECTORY: &str = "templates";

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(settings: Settings, test_pool: Option<PgPool>) -> Result<Self, Error> {
        let connection_pool = if let Some(pool) = test_pool {
            pool
        } else {
            get_connection_pool(&settings.database).await
        };

        sqlx::migrate!()
            .run(&connection_pool)
            .await
            .map_err(|e| Error::new(ErrorKind::Other, format!("Failed to migrate the database: {}", e)))?;

        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );

        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, connection_pool, settings).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), Error> {
        self.server.await
    }
}

pub async fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(settings.connect_to_db())
}

async fn run(
    listener: TcpListener,
    db_pool: PgPool,
    settings: Settings,
) -> Result<Server, Error> {
    let mailer = SmtpMailer::new(&settings.email)
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e))?;
    let verification = EmailVerification::new(
        &settings,
        Templates::from_directory(TEMPLATE_DIRECTORY),
        PgUserStore::new(db_pool),
        mailer,
    )
    .map_err(|e| Error::new(ErrorKind::InvalidInput, e))?;

    // Shared by every worker: config snapshot, templates, pool and SMTP transport.
    let verification = Data::new(verification);

    let server = HttpServer::new(move || {
        App::new()
            .route("/health_check/", get().to(health_check::<PgUserStore, SmtpMailer>))
            .configure(verification_routes_config::<PgUserStore, SmtpMailer>)
            .app_data(verification.clone())
    })
        .listen(listener)?
        .run();

    Ok(server)
}
