//! Protocol tests driving a guarded component through a scripted host

use permisos_runtime::{
    GuardedComponent, PermissionHost, PermissionsChecker, PermissionsDeniedHandler,
    RequiredPermissions, SharedDeniedHandler, PERMISSION_DENIED, PERMISSION_GRANTED,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const CAMERA: &str = "android.permission.CAMERA";
const LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
const CONTACTS: &str = "android.permission.READ_CONTACTS";

/// Grants what it is told to, never shows a rationale, records requests
#[derive(Default)]
struct ScriptedHost {
    granted: HashSet<String>,
    requested: Vec<(Vec<String>, i32)>,
}

impl PermissionHost for ScriptedHost {
    fn check_self_permission(&self, permission: &str) -> i32 {
        if self.granted.contains(permission) {
            PERMISSION_GRANTED
        } else {
            PERMISSION_DENIED
        }
    }

    fn should_show_request_permission_rationale(&self, _permission: &str) -> bool {
        false
    }

    fn request_permissions(&mut self, permissions: &[String], request_code: i32) {
        self.requested.push((permissions.to_vec(), request_code));
    }
}

#[derive(Default)]
struct RecordingHandler {
    denials: Vec<(i32, Vec<String>)>,
}

impl PermissionsDeniedHandler for RecordingHandler {
    fn do_on_permissions_denied(&mut self, request_code: i32, denied_permissions: &[String]) {
        self.denials.push((request_code, denied_permissions.to_vec()));
    }
}

#[test]
fn test_all_denied_results_report_full_set() {
    let mut component = GuardedComponent::new(ScriptedHost::default());
    let granted = Rc::new(RefCell::new(false));
    let rationale: Rc<RefCell<Option<Vec<String>>>> = Rc::new(RefCell::new(None));

    let g = Rc::clone(&granted);
    let r = Rc::clone(&rationale);
    component
        .check_permissions(
            42,
            Box::new(move || *g.borrow_mut() = true),
            Box::new(move |denied| *r.borrow_mut() = Some(denied)),
            &[CAMERA, LOCATION, CONTACTS],
        )
        .unwrap();
    assert_eq!(component.host().requested.len(), 1);
    assert!(component.gate().pending().is_some());

    component.on_request_permissions_result(
        42,
        &[CAMERA, LOCATION, CONTACTS],
        &[PERMISSION_DENIED, PERMISSION_DENIED, PERMISSION_DENIED],
    );

    assert!(!*granted.borrow());
    assert_eq!(
        rationale.borrow().as_deref(),
        Some(&[CAMERA.to_string(), LOCATION.to_string(), CONTACTS.to_string()][..])
    );
    assert!(component.gate().pending().is_none());
}

#[test]
fn test_cancelled_request_denies_everything() {
    let mut component = GuardedComponent::new(ScriptedHost::default());
    let rationale: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&rationale);
    component
        .check_permissions(
            5,
            Box::new(|| {}),
            Box::new(move |denied| *r.borrow_mut() = denied),
            &[CAMERA, LOCATION],
        )
        .unwrap();

    component.on_request_permissions_result(5, &[CAMERA, LOCATION], &[]);
    assert_eq!(*rationale.borrow(), vec![CAMERA.to_string(), LOCATION.to_string()]);
}

#[test]
fn test_guarded_action_runs_after_grant() {
    let mut component = GuardedComponent::new(ScriptedHost::default());
    let ran = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ran);
    let guard = RequiredPermissions::new(9, &[CAMERA]);

    guard
        .invoke(&mut component, move || *counter.borrow_mut() += 1, None)
        .unwrap();
    assert_eq!(*ran.borrow(), 0);

    component.host_mut().granted.insert(CAMERA.to_string());
    component.on_request_permissions_result(9, &[CAMERA], &[PERMISSION_GRANTED]);
    assert_eq!(*ran.borrow(), 1);

    // Already granted now: runs without a new request
    let counter = Rc::clone(&ran);
    guard
        .invoke(&mut component, move || *counter.borrow_mut() += 1, None)
        .unwrap();
    assert_eq!(*ran.borrow(), 2);
    assert_eq!(component.host().requested.len(), 1);
}

#[test]
fn test_denial_reaches_handler() {
    let mut component = GuardedComponent::new(ScriptedHost::default());
    let handler = Rc::new(RefCell::new(RecordingHandler::default()));
    let shared: SharedDeniedHandler = handler.clone();
    let guard = RequiredPermissions::new(11, &[CONTACTS]);

    guard.invoke(&mut component, || {}, Some(shared)).unwrap();
    component.on_request_permissions_result(11, &[CONTACTS], &[PERMISSION_DENIED]);

    assert_eq!(
        handler.borrow().denials,
        vec![(11, vec![CONTACTS.to_string()])]
    );
}
