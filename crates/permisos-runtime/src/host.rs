//! PermissionHost trait - the platform operations the protocol relies on
//!
//! A host answers permission-state queries and forwards requests to the
//! system dialog. The protocol code only ever talks to this trait.

/// `PackageManager.PERMISSION_GRANTED`
pub const PERMISSION_GRANTED: i32 = 0;
/// `PackageManager.PERMISSION_DENIED`
pub const PERMISSION_DENIED: i32 = -1;

/// Platform permission operations of one component
pub trait PermissionHost {
    /// `PERMISSION_GRANTED` or `PERMISSION_DENIED` for `permission`
    fn check_self_permission(&self, permission: &str) -> i32;

    /// Whether the user already denied `permission` and a rationale should be shown
    fn should_show_request_permission_rationale(&self, permission: &str) -> bool;

    /// Ask the system to request `permissions`
    ///
    /// The answer arrives later through `on_request_permissions_result`.
    fn request_permissions(&mut self, permissions: &[String], request_code: i32);
}

/// State of one permission at check time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionType {
    /// Already granted
    Granted,
    /// Requested before and denied by the user
    Denied,
    /// Never requested
    NotRequestedYet,
}

/// Permissions grouped by [`PermissionType`], each group in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedPermissions {
    /// Granted permissions
    pub granted: Vec<String>,
    /// Denied permissions
    pub denied: Vec<String>,
    /// Permissions never requested
    pub not_requested_yet: Vec<String>,
}

impl GroupedPermissions {
    /// The group for `ty`
    pub fn get(&self, ty: PermissionType) -> &[String] {
        match ty {
            PermissionType::Granted => &self.granted,
            PermissionType::Denied => &self.denied,
            PermissionType::NotRequestedYet => &self.not_requested_yet,
        }
    }
}

/// Classify `permissions` against the host
pub fn group_permissions<H: PermissionHost + ?Sized>(
    host: &H,
    permissions: &[&str],
) -> GroupedPermissions {
    let mut grouped = GroupedPermissions::default();
    for &permission in permissions {
        let group = if host.check_self_permission(permission) == PERMISSION_GRANTED {
            &mut grouped.granted
        } else if host.should_show_request_permission_rationale(permission) {
            &mut grouped.denied
        } else {
            &mut grouped.not_requested_yet
        };
        group.push(permission.to_string());
    }
    grouped
}
