use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use mailforge::auth::AuthMiddleware;
use mailforge::config::Config;
use mailforge::mail::SmtpMailer;
use mailforge::routes;
use mailforge::services::EmailService;
use mailforge::store::PgEmailStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let mailer = SmtpMailer::new(&config).expect("Failed to build SMTP transport");
    let store = PgEmailStore::new(pool);
    let service = EmailService::from_config(Arc::new(store), Arc::new(mailer), &config)
        .expect("Failed to wire email service");

    log::info!("Starting MailForge server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
