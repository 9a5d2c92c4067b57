//! Shared application state.
//!
//! Everything here is constructed exactly once at startup and handed to
//! components explicitly; there are no lazily initialized globals.

use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::email::EmailConfig;
use crate::config::jwt::JwtConfig;
use crate::utils::token::TokenService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub token_service: TokenService,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
}

pub async fn init_app_state() -> AppState {
    let jwt_config = JwtConfig::from_env();
    let token_service = TokenService::new(&jwt_config);

    AppState {
        db: init_db_pool().await,
        jwt_config,
        token_service,
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    }
}
