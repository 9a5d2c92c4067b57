use std::env;

/// Token signing configuration. TTLs are in seconds.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub session_ttl: i64,
    pub recovery_ttl: i64,
    pub invite_ttl: i64,
}

impl JwtConfig {
    /// Panics when `JWT_SECRET` is unset or blank. A missing secret is a
    /// deployment defect, not a runtime condition.
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        assert!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        Self {
            secret,
            session_ttl: env::var("JWT_SESSION_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86400), // 24 hours
            recovery_ttl: env::var("JWT_RECOVERY_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // 1 hour
            invite_ttl: env::var("JWT_INVITE_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800), // 7 days
        }
    }
}
