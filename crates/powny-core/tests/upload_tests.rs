//! Synchronization scenarios against an in-memory remote

use powny_core::{
    Change, Error, MemoryRuleStore, RemoteRuleStore, RemoteSnapshot, Result, RuleRepository,
    SyncState, UploadManifest, UploadOptions, UploadReport, Uploader,
};
use powny_test_utils::repo::RulesRepo;
use pretty_assertions::assert_eq;

fn upload(
    repo: &RuleRepository,
    remote: &MemoryRuleStore,
    options: &UploadOptions,
) -> Result<UploadReport> {
    let local = repo.current_rule_set()?;
    Uploader::new(repo, remote).upload(&local, options)
}

fn forced() -> UploadOptions {
    UploadOptions {
        force: true,
        ..UploadOptions::default()
    }
}

#[test]
fn test_edit_is_pushed_as_single_change() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::with_rules([("a.rule", "v1")]);
    let repo = RuleRepository::open(checkout.root()).unwrap();

    checkout.write_rule("a.rule", "v2");
    checkout.commit("bump a");
    let report = upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert!(report.pushed);
    assert_eq!(report.previous_version, "v0");
    assert_eq!(report.version, "v1");
    assert_eq!(report.manifest.len(), 1);
    assert!(matches!(
        report.manifest.entries()[0].change,
        Change::Changed { .. }
    ));

    let snapshot = remote.fetch().unwrap();
    assert_eq!(snapshot.version, "v1");
    assert_eq!(snapshot.rule_set.get("a.rule").unwrap().content(), "v2");
}

#[test]
fn test_second_upload_is_an_empty_noop() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1"), ("b.rule", "b")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();

    let first = upload(&repo, &remote, &UploadOptions::default()).unwrap();
    let second = upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert!(first.pushed);
    assert!(!second.pushed);
    assert!(second.manifest.is_empty());
    assert_eq!(second.version, first.version);
    assert_eq!(remote.pushes(), 1);
}

#[test]
fn test_unchanged_rules_against_up_to_date_remote_succeed() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::with_rules([("a.rule", "v1")]);
    let repo = RuleRepository::open(checkout.root()).unwrap();

    let report = upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert!(report.manifest.is_empty());
    assert_eq!(remote.version(), "v0");
    assert_eq!(remote.pushes(), 0);
}

#[test]
fn test_remote_change_since_last_sync_is_a_conflict() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();
    upload(&repo, &remote, &UploadOptions::default()).unwrap();

    remote.put_rule("b.rule", "from elsewhere");
    checkout.write_rule("a.rule", "v2");
    let err = upload(&repo, &remote, &UploadOptions::default()).unwrap_err();

    match &err {
        Error::SyncConflict {
            local_version,
            remote_version,
            remote_changes,
        } => {
            assert_eq!(local_version.as_deref(), Some("v1"));
            assert_eq!(remote_version, "v2");
            assert_eq!(remote_changes, &vec!["b.rule".to_string()]);
        }
        other => panic!("expected SyncConflict, got {other:?}"),
    }
    assert!(err.is_conflict());
    assert_eq!(
        remote.fetch().unwrap().rule_set.get("a.rule").unwrap().content(),
        "v1"
    );
}

#[test]
fn test_force_overrides_conflict_and_records_new_version() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();
    upload(&repo, &remote, &UploadOptions::default()).unwrap();
    remote.put_rule("b.rule", "from elsewhere");

    let report = upload(&repo, &remote, &forced()).unwrap();

    assert!(report.forced);
    assert_eq!(report.version, remote.version());
    assert!(remote.fetch().unwrap().rule_set.get("b.rule").is_none());

    let state = SyncState::load(&repo.git_dir()).unwrap().unwrap();
    assert_eq!(state.version, remote.version());

    // The recorded token now matches, so a plain upload succeeds again
    assert!(upload(&repo, &remote, &UploadOptions::default()).is_ok());
}

#[test]
fn test_sync_record_of_another_remote_does_not_vouch_for_this_one() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "mine")]);
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let staging = MemoryRuleStore::new().named("staging");
    let production =
        MemoryRuleStore::with_rules([("a.rule", "theirs"), ("b.rule", "theirs too")])
            .named("production");
    production.put_rule("b.rule", "theirs too");

    upload(&repo, &staging, &UploadOptions::default()).unwrap();
    // Both remotes are now at the same token
    assert_eq!(staging.version(), production.version());

    let err = upload(&repo, &production, &UploadOptions::default()).unwrap_err();

    match err {
        Error::SyncConflict { local_version, .. } => assert_eq!(local_version, None),
        other => panic!("expected SyncConflict, got {other:?}"),
    }
    let remote = production.fetch().unwrap().rule_set;
    assert_eq!(remote.get("a.rule").unwrap().content(), "theirs");
    assert_eq!(remote.get("b.rule").unwrap().content(), "theirs too");

    let state = SyncState::load(&repo.git_dir()).unwrap().unwrap();
    assert_eq!(state.remote, "staging");
}

#[test]
fn test_two_clients_from_same_token() {
    let remote = MemoryRuleStore::with_rules([("a.rule", "v1")]);
    let alice = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let bob = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let alice_repo = RuleRepository::open(alice.root()).unwrap();
    let bob_repo = RuleRepository::open(bob.root()).unwrap();

    // Both checkouts are in sync with v0
    upload(&alice_repo, &remote, &UploadOptions::default()).unwrap();
    upload(&bob_repo, &remote, &UploadOptions::default()).unwrap();

    alice.write_rule("a.rule", "alice");
    alice.commit("alice edit");
    upload(&alice_repo, &remote, &UploadOptions::default()).unwrap();

    bob.write_rule("a.rule", "bob");
    bob.commit("bob edit");
    let err = upload(&bob_repo, &remote, &UploadOptions::default()).unwrap_err();

    assert!(matches!(err, Error::SyncConflict { .. }));
    assert_eq!(
        remote.fetch().unwrap().rule_set.get("a.rule").unwrap().content(),
        "alice"
    );
}

#[test]
fn test_never_synced_checkout_matching_past_commit_is_not_a_conflict() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    checkout.write_rule("a.rule", "v2");
    checkout.commit("second");
    let remote = MemoryRuleStore::with_rules([("a.rule", "v1")]);
    let repo = RuleRepository::open(checkout.root()).unwrap();

    let report = upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert!(report.pushed);
    assert!(!report.forced);
}

#[test]
fn test_never_synced_checkout_with_foreign_remote_conflicts() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "mine")]);
    let remote = MemoryRuleStore::with_rules([("z.rule", "theirs")]);
    let repo = RuleRepository::open(checkout.root()).unwrap();

    let err = upload(&repo, &remote, &UploadOptions::default()).unwrap_err();

    match err {
        Error::SyncConflict {
            local_version,
            remote_changes,
            ..
        } => {
            assert_eq!(local_version, None);
            assert_eq!(remote_changes, vec!["a.rule", "z.rule"]);
        }
        other => panic!("expected SyncConflict, got {other:?}"),
    }
}

#[test]
fn test_dry_run_pushes_and_records_nothing() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();

    let report = upload(
        &repo,
        &remote,
        &UploadOptions {
            dry_run: true,
            ..UploadOptions::default()
        },
    )
    .unwrap();

    assert_eq!(report.manifest.len(), 1);
    assert!(!report.pushed);
    assert_eq!(remote.pushes(), 0);
    assert!(SyncState::load(&repo.git_dir()).unwrap().is_none());
}

#[test]
fn test_message_defaults_to_head_summary() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();

    upload(&repo, &remote, &UploadOptions::default()).unwrap();
    checkout.write_rule("b.rule", "b");
    checkout.commit("add b");
    upload(
        &repo,
        &remote,
        &UploadOptions {
            message: Some("explicit".into()),
            ..UploadOptions::default()
        },
    )
    .unwrap();

    assert_eq!(remote.messages(), vec!["Initial rules", "explicit"]);
}

#[test]
fn test_removed_rule_is_removed_remotely() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "a"), ("b.rule", "b")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();
    upload(&repo, &remote, &UploadOptions::default()).unwrap();

    checkout.remove_rule("b.rule");
    checkout.commit("drop b");
    let report = upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert_eq!(report.manifest.counts(), (0, 0, 1));
    let names: Vec<String> = remote
        .fetch()
        .unwrap()
        .rule_set
        .names()
        .map(String::from)
        .collect();
    assert_eq!(names, vec!["a.rule"]);
}

#[test]
fn test_round_trip_reproduces_local_rules() {
    let checkout = RulesRepo::with_rules(&[
        ("alerts/disk.rule", "[match]\nservice = \"disk\"\n"),
        ("alerts/load.rule", "[match]\nload = { gt = 1 }\n"),
        ("root.rule", ""),
    ]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();

    upload(&repo, &remote, &UploadOptions::default()).unwrap();

    let local = repo.current_rule_set().unwrap();
    assert!(remote.fetch().unwrap().rule_set.same_rules(&local));
}

#[test]
fn test_sync_state_stays_out_of_the_working_tree() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();

    upload(&repo, &remote, &UploadOptions::default()).unwrap();

    assert!(checkout.root().join(".git/powny/sync-state.json").exists());
    checkout.assert_file_not_exists("powny");
    let after = repo.current_rule_set().unwrap();
    assert_eq!(after.version(), repo.head().unwrap().map(|c| c.id).as_deref());
}

/// Lets another writer in between the fetch and the push.
struct RacingStore<'a> {
    inner: &'a MemoryRuleStore,
}

impl RemoteRuleStore for RacingStore<'_> {
    fn fetch(&self) -> Result<RemoteSnapshot> {
        let snapshot = self.inner.fetch()?;
        self.inner.put_rule("race.rule", "sneaked in");
        Ok(snapshot)
    }

    fn push(&self, manifest: &UploadManifest, base_version: &str) -> Result<String> {
        self.inner.push(manifest, base_version)
    }

    fn describe(&self) -> String {
        "racing".into()
    }
}

#[test]
fn test_push_race_is_surfaced_not_retried() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    let remote = MemoryRuleStore::new();
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let local = repo.current_rule_set().unwrap();

    let err = Uploader::new(&repo, RacingStore { inner: &remote })
        .upload(&local, &UploadOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::VersionConflict { .. }));
    assert!(err.is_conflict());
    assert_eq!(remote.pushes(), 1);
    assert!(remote.fetch().unwrap().rule_set.get("a.rule").is_none());
    assert!(SyncState::load(&repo.git_dir()).unwrap().is_none());
}

#[test]
fn test_non_utf8_rule_is_never_uploaded() {
    let checkout = RulesRepo::with_rules(&[("a.rule", "v1")]);
    std::fs::write(checkout.root().join("bin.rule"), [0xc3, 0x28]).unwrap();
    let repo = RuleRepository::open(checkout.root()).unwrap();
    let remote = MemoryRuleStore::new();

    let err = upload(&repo, &remote, &forced()).unwrap_err();

    assert!(matches!(err, Error::InvalidRuleEncoding { ref name } if name == "bin.rule"));
    assert_eq!(remote.pushes(), 0);
    assert!(SyncState::load(&repo.git_dir()).unwrap().is_none());
}
