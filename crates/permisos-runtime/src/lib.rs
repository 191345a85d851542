//! Permisos runtime
//!
//! The permission-check protocol that generated `Permisos_*` components
//! implement, expressed against an abstract [`PermissionHost`]:
//!
//! - [`group_permissions`] splits permissions into granted, denied and
//!   never-requested
//! - [`PermissionGate`] holds at most one pending request and matches the
//!   host's answer back to it
//! - [`RequiredPermissions`] guards a single action

#![warn(missing_docs)]

pub mod error;
pub mod gate;
pub mod guard;
pub mod host;

pub use error::{PermissionError, PermissionResult};
pub use gate::{
    GuardedComponent, OnAllGranted, OnRationaleNeeded, PendingRequest, PermissionGate,
    PermissionsChecker,
};
pub use guard::{PermissionsDeniedHandler, RequiredPermissions, SharedDeniedHandler};
pub use host::{
    group_permissions, GroupedPermissions, PermissionHost, PermissionType, PERMISSION_DENIED,
    PERMISSION_GRANTED,
};
