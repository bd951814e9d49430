//! Shared test helpers

pub mod database_helper;
pub mod mail_mock;
pub mod test_data;

pub use database_helper::TestDatabase;
pub use mail_mock::MailMockServer;
pub use test_data::*;

use gatherly::config::Settings;
use gatherly::services::ServiceFactory;
use sqlx::PgPool;

/// Build a service factory over the test pool.
///
/// The mailer points at an unroutable port by default; notification sends are
/// fire-and-forget, so tests that don't assert on delivery just let them fail.
pub fn test_services(pool: PgPool) -> ServiceFactory {
    let mut settings = Settings::default();
    settings.mailer.api_url = "http://127.0.0.1:9/v1/send".to_string();
    settings.mailer.timeout_seconds = 1;

    ServiceFactory::new(pool, settings).expect("Failed to build services")
}

/// Build a service factory whose mailer talks to the given mock URL
pub fn test_services_with_mailer(pool: PgPool, mail_url: String) -> ServiceFactory {
    let mut settings = Settings::default();
    settings.mailer.api_url = mail_url;
    settings.mailer.timeout_seconds = 2;

    ServiceFactory::new(pool, settings).expect("Failed to build services")
}
