//! Configuration modules for the Practia API.
//!
//! Each submodule handles one aspect of configuration, loaded from
//! environment variables once at startup and carried in
//! [`crate::state::AppState`]. Missing required variables (the database
//! URL, the token secret) abort startup rather than limping along with a
//! broken configuration.

pub mod cors;
pub mod database;
pub mod email;
pub mod jwt;
