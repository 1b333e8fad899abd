//! Contract Test: Session Lifecycle
//!
//! Verifies the login -> fetch -> reconcile -> submit -> logout sequence:
//! - A rejected login stops everything; no logout without a session
//! - Once logged in, logout is always attempted
//! - Update failures are fatal for the domain, logout failures are not
//! - Transport failures surface as their own error kind

mod common;

use common::*;
use ddns_bridge_core::traits::AuditLog;
use ddns_bridge_core::{Error, MemoryAuditLog, Outcome, SessionState};

#[tokio::test]
async fn changed_record_is_submitted_inside_one_session() {
    let api = MockDnsApi::new().with_zone(
        "example.com",
        vec![a("home", "1.1.1.1"), a("www", "1.1.1.1")],
    );
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let report = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await
        .expect("session succeeds");

    assert_eq!(
        api.calls(),
        vec!["login", "fetch:example.com", "update:example.com", "logout"]
    );
    assert!(report.submitted);
    assert_eq!(report.state(), SessionState::LoggedOut);
    assert_eq!(Outcome::from_report(&report).to_string(), "good 2.2.2.2");

    // Full record set goes back, only the in-scope record differs
    let submitted = &api.submissions()[0];
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].destination, "2.2.2.2");
    assert_eq!(submitted[1].destination, "1.1.1.1");

    let trail = audit.entries("home.example.com").await.unwrap();
    let messages: Vec<&str> = trail
        .iter()
        .map(|e| e.split_once("] ").map(|(_, m)| m).unwrap_or(e))
        .collect();
    assert_eq!(
        messages,
        vec![
            "api login successful",
            "IPv4 for home.example.com set to 2.2.2.2",
            "dns recordset updated",
            "api logout successful",
        ]
    );
}

#[tokio::test]
async fn unchanged_record_skips_update_but_logs_out() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let report = orchestrator
        .process_request(&raw_request("home.example.com", Some("1.1.1.1"), None))
        .await
        .unwrap();

    assert_eq!(api.calls(), vec!["login", "fetch:example.com", "logout"]);
    assert!(!report.submitted);
    assert_eq!(Outcome::from_report(&report).to_string(), "nochg 1.1.1.1");
}

#[tokio::test]
async fn unmatched_domain_is_nohost_without_submission() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("mail", "1.1.1.1")]);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let report = orchestrator
        .process_request(&raw_request("www.example.com", Some("9.9.9.9"), None))
        .await
        .unwrap();

    assert_eq!(api.call_count("update"), 0);
    assert_eq!(api.call_count("logout"), 1);
    assert_eq!(Outcome::from_report(&report), Outcome::NoHost);
}

#[tokio::test]
async fn missing_record_list_is_a_valid_empty_zone() {
    let api = MockDnsApi::new();
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let report = orchestrator
        .process_request(&raw_request("www.example.com", Some("9.9.9.9"), None))
        .await
        .unwrap();

    assert!(!report.reconciliation.matched);
    assert_eq!(api.calls(), vec!["login", "fetch:example.com", "logout"]);
}

#[tokio::test]
async fn rejected_login_halts_before_fetch() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.set_login_status(4013);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(
        result,
        Err(Error::Authentication { status_code: 4013, .. })
    ));
    assert_eq!(api.calls(), vec!["login"]);
}

#[tokio::test]
async fn credential_mismatch_never_reaches_remote_api() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let mut raw = raw_request("home.example.com", Some("2.2.2.2"), None);
    raw.password = Some("wrong".to_string());
    let result = orchestrator.process_request(&raw).await;

    assert!(matches!(result, Err(Error::CredentialMismatch)));
    assert_eq!(Outcome::from_result(&result), Outcome::BadAuth);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn invalid_request_never_reaches_remote_api() {
    let api = MockDnsApi::new();
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("not-an-ip"), None))
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn rejected_update_still_logs_out() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.set_update_status(5029);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(result, Err(Error::Update { status_code: 5029, .. })));
    assert_eq!(
        api.calls(),
        vec!["login", "fetch:example.com", "update:example.com", "logout"]
    );
    // Nothing was applied remotely
    assert_eq!(api.zone("example.com")[0].destination, "1.1.1.1");
    assert_eq!(Outcome::from_result(&result).status(), "911");
}

#[tokio::test]
async fn rejected_logout_does_not_invalidate_update() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.set_logout_status(4001);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let report = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await
        .expect("logout failure is only a warning");

    assert!(report.submitted);
    assert!(report.logout_warning.is_some());
    assert_eq!(report.state(), SessionState::ReconciledSubmitted);
    assert_eq!(Outcome::from_report(&report).to_string(), "good 2.2.2.2");
}

#[tokio::test]
async fn fetch_transport_failure_is_transport_error_and_logs_out() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.fail_transport("fetch:");
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(api.calls(), vec!["login", "fetch:example.com", "logout"]);

    let trail = audit.entries("home.example.com").await.unwrap();
    assert!(
        trail
            .iter()
            .any(|e| e.ends_with("transport error: connection reset during fetch:example.com"))
    );
    assert!(trail.iter().any(|e| e.ends_with("api logout successful")));
}

#[tokio::test]
async fn update_and_logout_transport_failures_are_audited() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.fail_transport("update:");
    api.fail_transport("logout");
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    let trail = audit.entries("home.example.com").await.unwrap();
    assert!(
        trail
            .iter()
            .any(|e| e.ends_with("connection reset during update:example.com"))
    );
    assert!(trail.iter().any(|e| e.ends_with("connection reset during logout")));
}

#[tokio::test]
async fn rejected_fetch_is_not_treated_as_empty_zone() {
    let api = MockDnsApi::new().with_zone("example.com", vec![a("home", "1.1.1.1")]);
    api.set_fetch_status(5029);
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(api.call_count("update"), 0);
    assert_eq!(api.call_count("logout"), 1);
}

#[tokio::test]
async fn login_transport_failure_skips_logout() {
    let api = MockDnsApi::new();
    api.fail_transport("login");
    let audit = MemoryAuditLog::new();
    let orchestrator = orchestrator(&api, &audit);

    let result = orchestrator
        .process_request(&raw_request("home.example.com", Some("2.2.2.2"), None))
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(api.calls(), vec!["login"]);

    let trail = audit.entries("home.example.com").await.unwrap();
    assert_eq!(trail.len(), 1);
    assert!(trail[0].ends_with("transport error: connection reset during login"));
}
