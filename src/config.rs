use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    /// Upper bound on a single SMTP send before it is abandoned.
    pub send_timeout: Duration,
    /// Media host whose PDF/image URLs get special attachment handling.
    pub asset_host: String,
    /// Directory for downloaded attachment scratch files.
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            smtp_host: env::var("SMTP_HOST").expect("SMTP_HOST must be set"),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .expect("SMTP_PORT must be a number"),
            smtp_username: env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set"),
            smtp_password: env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set"),
            from_email: env::var("EMAIL_FROM").expect("EMAIL_FROM must be set"),
            from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "MailForge".to_string()),
            send_timeout: Duration::from_secs(
                env::var("EMAIL_SEND_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("EMAIL_SEND_TIMEOUT_SECS must be a number"),
            ),
            asset_host: env::var("ASSET_HOST")
                .unwrap_or_else(|_| "res.cloudinary.com".to_string()),
            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("mailforge")),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required environment variables
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("SMTP_HOST", "smtp.test.local");
        env::set_var("SMTP_USERNAME", "mailer@test.local");
        env::set_var("SMTP_PASSWORD", "secret");
        env::set_var("EMAIL_FROM", "no-reply@test.local");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_name, "MailForge");
        assert_eq!(config.send_timeout, Duration::from_secs(30));
        assert_eq!(config.asset_host, "res.cloudinary.com");

        // Test custom values
        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("EMAIL_SEND_TIMEOUT_SECS", "5");
        env::set_var("ASSET_HOST", "media.example.com");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.send_timeout, Duration::from_secs(5));
        assert_eq!(config.asset_host, "media.example.com");
    }
}
