//! Shared utilities:
//!
//! - [`email`]: SMTP delivery for recovery and invitation mail
//! - [`token`]: scoped token signing and verification

pub mod email;
pub mod token;
