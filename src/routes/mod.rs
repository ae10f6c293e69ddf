pub mod emails;
pub mod health;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/emails")
            .service(emails::send_email)
            .service(emails::get_emails)
            .service(emails::test_connection)
            .service(emails::track_email)
            .service(emails::get_email),
    );
}
