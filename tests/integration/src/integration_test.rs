//! End-to-end integration tests across the powny crates
//!
//! These exercise the complete flow: rule checkout -> upload to a remote
//! store -> evaluation of the remote rules -> live dispatch of actions.

use std::time::Duration;

use mockito::{Matcher, Server};
use powny_api::{ApiClient, ApiConfig, EventDispatchClient, HttpRuleStore, LiveDispatcher};
use powny_core::{
    Evaluator, Event, MemoryRuleStore, RemoteRuleStore, RuleRepository, SyncState, UploadOptions,
    Uploader,
};
use powny_test_utils::repo::RulesRepo;
use pretty_assertions::assert_eq;
use serde_json::json;

const DISK_RULE: &str = r#"
[meta]
description = "Critical disk"

[match]
host = "web-*"
service = "disk*"
severity = "CRIT"

[[actions]]
kind = "notify"
target = "ops"
message = "{{host}}: {{service}}"
"#;

const LOAD_RULE: &str = r#"
[match]
"metrics.load" = { gt = 4 }

[[actions]]
kind = "scale"
replicas = 2
"#;

fn api_config(server: &Server) -> ApiConfig {
    ApiConfig::new(server.url(), Duration::from_secs(5))
}

#[test]
fn uploaded_rules_evaluate_like_the_checkout() {
    let checkout = RulesRepo::with_rules(&[("disk.rule", DISK_RULE), ("load.rule", LOAD_RULE)]);
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let remote = MemoryRuleStore::new();

    let local = repo.current_rule_set().unwrap();
    let report = Uploader::new(&repo, &remote)
        .upload(&local, &UploadOptions::default())
        .unwrap();
    assert!(report.pushed);

    let snapshot = remote.fetch().unwrap();
    assert!(snapshot.rule_set.same_rules(&local));

    let event = Event::from_value(json!({
        "host": "web-3",
        "service": "disk_var",
        "severity": "CRIT",
        "metrics": {"load": 7.5},
    }))
    .unwrap();
    let from_remote = Evaluator::check(&snapshot.rule_set, &event);
    let from_checkout = Evaluator::check(&local, &event);

    assert_eq!(
        from_remote.matched_names().collect::<Vec<_>>(),
        vec!["disk.rule", "load.rule"]
    );
    assert_eq!(
        from_remote.to_json_pretty().unwrap(),
        from_checkout.to_json_pretty().unwrap()
    );
}

#[test]
fn matched_actions_are_dispatched_to_the_cluster() {
    let checkout = RulesRepo::with_rules(&[("disk.rule", DISK_RULE), ("load.rule", LOAD_RULE)]);
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let evaluator = Evaluator::load(&repo.current_rule_set().unwrap());

    let mut server = Server::new();
    let notify = server
        .mock("POST", "/v1/jobs")
        .match_body(Matcher::Json(json!({
            "rule": "disk.rule",
            "action": "notify",
            "target": "ops",
            "message": "web-1: disk_root",
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .expect(1)
        .create();

    let client = EventDispatchClient::new(ApiClient::new(&api_config(&server)).unwrap());
    let mut dispatcher = LiveDispatcher::new(&client);
    let event = Event::from_triple("web-1", "disk_root", "CRIT");

    let result = evaluator.run(&event, &mut dispatcher).unwrap();

    assert_eq!(result.matched_names().collect::<Vec<_>>(), vec!["disk.rule"]);
    assert_eq!(result.unmatched, vec!["load.rule".to_string()]);
    assert_eq!(dispatcher.sent(), 1);
    notify.assert();
}

#[test]
fn http_upload_then_rerun_is_a_noop() {
    let checkout = RulesRepo::with_rules(&[("disk.rule", DISK_RULE)]);
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let local = repo.current_rule_set().unwrap();

    let mut server = Server::new();
    let empty = server
        .mock("GET", "/v1/rules")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"version": "v1", "rules": {}}).to_string())
        .create();
    let push = server
        .mock("POST", "/v1/rules")
        .match_body(Matcher::PartialJson(json!({"base_version": "v1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"version": "v2"}).to_string())
        .expect(1)
        .create();

    let store = HttpRuleStore::new(ApiClient::new(&api_config(&server)).unwrap());
    let first = Uploader::new(&repo, &store)
        .upload(&local, &UploadOptions::default())
        .unwrap();
    assert_eq!(first.version, "v2");

    empty.remove();
    let _mock = server
        .mock("GET", "/v1/rules")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"version": "v2", "rules": {"disk.rule": DISK_RULE}}).to_string())
        .create();

    let second = Uploader::new(&repo, &store)
        .upload(&local, &UploadOptions::default())
        .unwrap();

    assert!(!second.pushed);
    assert_eq!(second.version, "v2");
    push.assert();

    let state = SyncState::load(&repo.git_dir()).unwrap().unwrap();
    assert_eq!(state.version, "v2");
}
