//! Method-level guards
//!
//! A [`RequiredPermissions`] value describes one guarded action: the action
//! runs only once its permissions are granted, and a denial is reported to
//! the component's [`PermissionsDeniedHandler`] if it has one.

use crate::error::PermissionResult;
use crate::gate::PermissionsChecker;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives denials of guarded actions
pub trait PermissionsDeniedHandler {
    /// `denied_permissions` is never empty
    fn do_on_permissions_denied(&mut self, request_code: i32, denied_permissions: &[String]);
}

/// Shared handle to a denial handler
pub type SharedDeniedHandler = Rc<RefCell<dyn PermissionsDeniedHandler>>;

/// Request code and permissions guarding one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPermissions {
    /// Unique per component
    pub request_code: i32,
    /// Permissions the action needs
    pub permissions: Vec<String>,
}

impl RequiredPermissions {
    /// Describe a guard
    pub fn new(request_code: i32, permissions: &[&str]) -> Self {
        Self {
            request_code,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Run `action` through `checker`
    pub fn invoke<C: PermissionsChecker + ?Sized>(
        &self,
        checker: &mut C,
        action: impl FnOnce() + 'static,
        denied_handler: Option<SharedDeniedHandler>,
    ) -> PermissionResult<()> {
        let request_code = self.request_code;
        let permissions: Vec<&str> = self.permissions.iter().map(String::as_str).collect();
        checker.check_permissions(
            request_code,
            Box::new(action),
            Box::new(move |denied: Vec<String>| {
                if let Some(handler) = denied_handler {
                    handler
                        .borrow_mut()
                        .do_on_permissions_denied(request_code, &denied);
                }
            }),
            &permissions,
        )
    }
}
