#![doc = "The `mailforge` library crate."]
#![doc = ""]
#![doc = "This crate contains the email send/record lifecycle for the MailForge CRM"]
#![doc = "backend: attachment resolution, template rendering, the SMTP transport"]
#![doc = "boundary, the email record store, and the orchestrating service, plus the"]
#![doc = "HTTP routes and authentication middleware in front of them."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
