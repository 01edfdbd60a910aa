//! Service configuration.

/// Credentials for the seeded admin account. When present, the store
/// creates (or refreshes) an approved admin row at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Configuration for the daemon, assembled from CLI flags and environment
/// in `main`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the API server binds.
    pub bind: String,

    /// Path to the SQLite database file.
    pub database: String,

    /// Secret for signing bearer tokens.
    pub jwt_secret: String,

    /// From-address for outgoing notices.
    pub mail_from: String,

    /// Optional admin account to seed at startup.
    pub admin_seed: Option<AdminSeed>,
}

impl ServiceConfig {
    pub fn new(bind: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            bind: bind.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Set the admin seed (used by tests and `main`).
    pub fn with_admin(mut self, username: &str, email: &str, password: &str) -> Self {
        self.admin_seed = Some(AdminSeed {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        self
    }

    pub fn with_jwt_secret(mut self, secret: &str) -> Self {
        self.jwt_secret = secret.to_string();
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            database: "bibliotheca.db".to_string(),
            jwt_secret: "dev-secret-change-me".to_string(),
            mail_from: "no-reply@lms.local".to_string(),
            admin_seed: None,
        }
    }
}
