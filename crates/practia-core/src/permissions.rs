//! Roles, permission tags, and the effective-permission resolver.
//!
//! A user's effective permission set is the union of their role's default
//! set and their explicit grants. Grants are additive only; there is no way
//! to subtract a default permission from a role.
//!
//! Both enumerations are closed. An unknown role cannot be constructed past
//! the database boundary, and an unknown grant tag fails parsing loudly: a
//! row carrying one is a data-integrity bug, not a runtime condition to
//! swallow.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Staff roles, lowest privilege last. Stored as the Postgres enum
/// `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Base,
}

impl Default for Role {
    fn default() -> Self {
        Role::Base
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Base => "base",
        };
        f.write_str(name)
    }
}

/// Permission tags. Serialized as their wire form, e.g. `VIEW_CYCLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewUser,
    EditUser,
    InviteUser,
    ViewStudent,
    EditStudent,
    ViewCareer,
    EditCareer,
    ViewCycle,
    EditCycle,
    ViewDepartment,
    EditDepartment,
    ViewCategory,
    EditCategory,
    ViewVacancy,
    EditVacancy,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Permission::ViewUser,
        Permission::EditUser,
        Permission::InviteUser,
        Permission::ViewStudent,
        Permission::EditStudent,
        Permission::ViewCareer,
        Permission::EditCareer,
        Permission::ViewCycle,
        Permission::EditCycle,
        Permission::ViewDepartment,
        Permission::EditDepartment,
        Permission::ViewCategory,
        Permission::EditCategory,
        Permission::ViewVacancy,
        Permission::EditVacancy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewUser => "VIEW_USER",
            Permission::EditUser => "EDIT_USER",
            Permission::InviteUser => "INVITE_USER",
            Permission::ViewStudent => "VIEW_STUDENT",
            Permission::EditStudent => "EDIT_STUDENT",
            Permission::ViewCareer => "VIEW_CAREER",
            Permission::EditCareer => "EDIT_CAREER",
            Permission::ViewCycle => "VIEW_CYCLE",
            Permission::EditCycle => "EDIT_CYCLE",
            Permission::ViewDepartment => "VIEW_DEPARTMENT",
            Permission::EditDepartment => "EDIT_DEPARTMENT",
            Permission::ViewCategory => "VIEW_CATEGORY",
            Permission::EditCategory => "EDIT_CATEGORY",
            Permission::ViewVacancy => "VIEW_VACANCY",
            Permission::EditVacancy => "EDIT_VACANCY",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown permission tag: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

impl Role {
    /// The static role-defaults table. Identical across every deployed
    /// instance; explicit grants build on top of this, never replace it.
    pub fn default_permissions(self) -> &'static [Permission] {
        match self {
            Role::Base => &[
                Permission::ViewStudent,
                Permission::ViewCareer,
                Permission::ViewCycle,
                Permission::ViewDepartment,
                Permission::ViewCategory,
                Permission::ViewVacancy,
            ],
            Role::Member => &[
                Permission::ViewStudent,
                Permission::ViewCareer,
                Permission::ViewCycle,
                Permission::ViewDepartment,
                Permission::ViewCategory,
                Permission::ViewVacancy,
                Permission::EditStudent,
                Permission::EditVacancy,
                Permission::EditCategory,
            ],
            Role::Admin => &Permission::ALL,
        }
    }
}

/// Compute the effective permission set for a principal: role defaults
/// united with explicit grants, duplicates collapsed.
pub fn effective_permissions(role: Role, grants: &[Permission]) -> HashSet<Permission> {
    role.default_permissions()
        .iter()
        .copied()
        .chain(grants.iter().copied())
        .collect()
}

/// Parse stored grant tags. Fails on the first unknown tag.
pub fn parse_grants(tags: &[String]) -> Result<Vec<Permission>, UnknownPermission> {
    tags.iter().map(|tag| tag.parse()).collect()
}
