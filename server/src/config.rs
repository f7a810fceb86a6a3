//! Configuration management for the inscriptions server.
//!
//! Loads a `.env` file when present, then reads environment variables with
//! sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "inscriptions=info,tower_http=debug";

/// Configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `SMTP_TRANSPORT` is neither `smtp` nor `console`
    #[error("Unknown SMTP_TRANSPORT: {0} (expected smtp or console)")]
    UnknownTransport(String),

    /// SMTP delivery selected without a login
    #[error("SMTP_USER and SMTP_PASS are required when SMTP_TRANSPORT=smtp")]
    MissingSmtpCredentials,

    /// No administrator address
    #[error("NOTIFY_EMAIL is required")]
    MissingNotifyEmail,

    /// A host/port pair does not form a socket address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Registration database configuration
    pub database: DatabaseConfig,
    /// Outbound mail configuration
    pub smtp: SmtpConfig,
    /// Administrator notification configuration
    pub notification: NotificationConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log filter directives
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Registration database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Limit for each store call, in milliseconds
    pub operation_timeout_ms: u64,
}

/// How outbound mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    /// Authenticated SMTP relay
    Smtp,
    /// Log messages instead of sending them
    Console,
}

/// Outbound mail configuration
#[derive(Clone)]
pub struct SmtpConfig {
    /// `smtp` or `console`
    pub transport: String,
    /// Relay host
    pub host: String,
    /// Relay port
    pub port: u16,
    /// Login, also the sender address
    pub user: Option<String>,
    /// Password
    pub pass: Option<String>,
    /// Sender display name
    pub from_name: String,
    /// Limit for each send, in milliseconds
    pub send_timeout_ms: u64,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "<redacted>"))
            .field("from_name", &self.from_name)
            .field("send_timeout_ms", &self.send_timeout_ms)
            .finish()
    }
}

/// Administrator notification configuration
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Address that receives one email per registration
    pub notify_email: Option<String>,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// Unparsable numbers fall back to their defaults; call
    /// [`Config::validate`] before using the result.
    #[must_use]
    pub fn from_env() -> Self {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            non_empty(lookup(key)).unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str| non_empty(lookup(key));

        Self {
            server: ServerConfig {
                host: text("HOST", "0.0.0.0"),
                port: parse_or(number("PORT"), 3000),
                log_level: text("RUST_LOG", DEFAULT_LOG_FILTER),
                metrics_host: text("METRICS_HOST", "0.0.0.0"),
                metrics_port: parse_or(number("METRICS_PORT"), 9090),
                shutdown_timeout: parse_or(number("SHUTDOWN_TIMEOUT"), 30),
            },
            database: DatabaseConfig {
                url: text("DATABASE_URL", "sqlite://inscriptions.db"),
                max_connections: parse_or(number("DATABASE_MAX_CONNECTIONS"), 5),
                operation_timeout_ms: parse_or(number("DATABASE_OPERATION_TIMEOUT_MS"), 5_000),
            },
            smtp: SmtpConfig {
                transport: text("SMTP_TRANSPORT", "smtp"),
                host: text("SMTP_HOST", "smtp.gmail.com"),
                port: parse_or(number("SMTP_PORT"), 587),
                user: non_empty(lookup("SMTP_USER")),
                pass: non_empty(lookup("SMTP_PASS")),
                from_name: text("SMTP_FROM_NAME", "Inscriptions"),
                send_timeout_ms: parse_or(number("MAIL_SEND_TIMEOUT_MS"), 10_000),
            },
            notification: NotificationConfig {
                notify_email: non_empty(lookup("NOTIFY_EMAIL")),
            },
        }
    }

    /// Check the combinations `from_env` cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.mail_transport()? == MailTransport::Smtp
            && (self.smtp.user.is_none() || self.smtp.pass.is_none())
        {
            return Err(ConfigError::MissingSmtpCredentials);
        }
        if self.notification.notify_email.is_none() {
            return Err(ConfigError::MissingNotifyEmail);
        }
        self.server.metrics_addr()?;
        Ok(())
    }
}

impl ServerConfig {
    /// `host:port` for the HTTP listener
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Socket address of the Prometheus scrape endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if the host is not an IP address.
    pub fn metrics_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.metrics_host, self.metrics_port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    /// Grace period for in-flight requests
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl DatabaseConfig {
    /// Limit for each store call
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl SmtpConfig {
    /// Parsed `SMTP_TRANSPORT`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTransport`] for any other value.
    pub fn mail_transport(&self) -> Result<MailTransport, ConfigError> {
        match self.transport.to_ascii_lowercase().as_str() {
            "smtp" => Ok(MailTransport::Smtp),
            "console" => Ok(MailTransport::Console),
            _ => Err(ConfigError::UnknownTransport(self.transport.clone())),
        }
    }

    /// Limit for each send
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
