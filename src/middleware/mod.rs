//! Request middleware and extractors.
//!
//! # Authentication flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`auth::AuthUser`] / [`auth::AuthStudent`] verify the token's
//!    signature, time window, and scope
//! 3. The principal is re-loaded from the database; permissions are
//!    re-derived from the fresh row, not from the token snapshot
//! 4. Permission extractors (`RequireEditCycle`, ...) check the route's
//!    required permissions before the handler runs
//!
//! Every request is verified from scratch; no state is retained between
//! requests.

pub mod auth;
