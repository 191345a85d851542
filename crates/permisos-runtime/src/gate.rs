//! The pending-request state machine
//!
//! A component owns one [`PermissionGate`]. Checking permissions either
//! answers immediately or stores a [`PendingRequest`] and asks the host;
//! the host's answer is matched back by request code.

use crate::error::{PermissionError, PermissionResult};
use crate::host::{group_permissions, PermissionHost, PERMISSION_GRANTED};
use tracing::debug;

/// Called once every requested permission is granted
pub type OnAllGranted = Box<dyn FnOnce()>;
/// Called with the denied permissions when a rationale should be shown
pub type OnRationaleNeeded = Box<dyn FnOnce(Vec<String>)>;

/// A request waiting for the host's answer
pub struct PendingRequest {
    /// Code the answer must carry
    pub request_code: i32,
    /// Success callback
    pub on_all_granted: OnAllGranted,
    /// Rationale callback
    pub on_rationale_needed: OnRationaleNeeded,
    /// Permissions known to be denied, accumulated across the request
    pub denied: Vec<String>,
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("request_code", &self.request_code)
            .field("denied", &self.denied)
            .finish_non_exhaustive()
    }
}

/// Check-and-request entry point implemented by guarded components
pub trait PermissionsChecker {
    /// Run `on_all_granted` if all `permissions` are granted, requesting
    /// them first when needed; otherwise run `on_rationale_needed` with the
    /// denied ones.
    fn check_permissions(
        &mut self,
        request_code: i32,
        on_all_granted: OnAllGranted,
        on_rationale_needed: OnRationaleNeeded,
        permissions: &[&str],
    ) -> PermissionResult<()>;
}

/// At most one pending request; a new request replaces the old one
#[derive(Debug, Default)]
pub struct PermissionGate {
    pending: Option<PendingRequest>,
}

impl PermissionGate {
    /// A gate with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending request, if any
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Check `permissions` against `host`, requesting what was never requested
    pub fn check_permissions<H: PermissionHost + ?Sized>(
        &mut self,
        host: &mut H,
        request_code: i32,
        on_all_granted: OnAllGranted,
        on_rationale_needed: OnRationaleNeeded,
        permissions: &[&str],
    ) -> PermissionResult<()> {
        if request_code & !0xffff != 0 {
            return Err(PermissionError::InvalidRequestCode(request_code));
        }

        let grouped = group_permissions(&*host, permissions);
        if permissions.is_empty() || grouped.granted.len() == permissions.len() {
            on_all_granted();
            return Ok(());
        }

        if grouped.not_requested_yet.is_empty() {
            debug_assert!(!grouped.denied.is_empty());
            on_rationale_needed(grouped.denied);
            return Ok(());
        }

        debug!(
            "Requesting {} permission(s) with code {}",
            grouped.not_requested_yet.len(),
            request_code
        );
        self.pending = Some(PendingRequest {
            request_code,
            on_all_granted,
            on_rationale_needed,
            denied: grouped.denied,
        });
        host.request_permissions(&grouped.not_requested_yet, request_code);
        Ok(())
    }

    /// Deliver the host's answer
    ///
    /// An empty `grant_results` means the request was cancelled and every
    /// permission counts as denied. Answers for other request codes are
    /// ignored and keep the pending request.
    pub fn on_request_permissions_result(
        &mut self,
        request_code: i32,
        permissions: &[&str],
        grant_results: &[i32],
    ) {
        match &self.pending {
            Some(pending) if pending.request_code == request_code => {}
            _ => return,
        }
        let Some(mut pending) = self.pending.take() else {
            return;
        };

        let newly_denied = permissions.iter().enumerate().filter(|(i, _)| {
            grant_results.is_empty()
                || grant_results.get(*i).copied().unwrap_or(crate::host::PERMISSION_DENIED)
                    != PERMISSION_GRANTED
        });
        pending
            .denied
            .extend(newly_denied.map(|(_, p)| p.to_string()));

        if pending.denied.is_empty() {
            (pending.on_all_granted)();
        } else {
            (pending.on_rationale_needed)(pending.denied);
        }
    }
}

/// A host together with its gate, the shape of a generated component
#[derive(Debug)]
pub struct GuardedComponent<H> {
    host: H,
    gate: PermissionGate,
}

impl<H: PermissionHost> GuardedComponent<H> {
    /// Wrap `host`
    pub fn new(host: H) -> Self {
        Self {
            host,
            gate: PermissionGate::new(),
        }
    }

    /// The wrapped host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the wrapped host
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The gate
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Forward the host's answer to the gate
    pub fn on_request_permissions_result(
        &mut self,
        request_code: i32,
        permissions: &[&str],
        grant_results: &[i32],
    ) {
        self.gate
            .on_request_permissions_result(request_code, permissions, grant_results);
    }
}

impl<H: PermissionHost> PermissionsChecker for GuardedComponent<H> {
    fn check_permissions(
        &mut self,
        request_code: i32,
        on_all_granted: OnAllGranted,
        on_rationale_needed: OnRationaleNeeded,
        permissions: &[&str],
    ) -> PermissionResult<()> {
        self.gate.check_permissions(
            &mut self.host,
            request_code,
            on_all_granted,
            on_rationale_needed,
            permissions,
        )
    }
}
