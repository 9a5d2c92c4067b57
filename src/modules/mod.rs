//! Feature modules. Each follows the same structure: `model.rs` (data and
//! DTOs), `service.rs` (business logic), `controller.rs` (HTTP handlers),
//! `router.rs` (route wiring).

pub mod auth;
pub mod cycles;
pub mod students;
pub mod users;
