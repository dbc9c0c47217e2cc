//! Behavior of a repository cloned from an upstream in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vecosy_crypto::{sign_token, SigningKey};
use vecosy_repo::{ChangeEvent, ConfigRepo, ErrorClass, PumpExit, RepoConfig, RepoError};
use vecosy_store::{InMemoryObjectStore, Snapshot};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn publish(upstream: &InMemoryObjectStore, branch: &str, snapshot: Snapshot) {
    let id = upstream.commit(snapshot);
    upstream.set_branch(branch, id).unwrap();
}

fn yml(content: &str) -> Snapshot {
    Snapshot::new().with_file("config.yml", content)
}

fn open_config() -> RepoConfig {
    RepoConfig {
        security_enabled: false,
        ..RepoConfig::default()
    }
}

async fn repo_over(upstream: &Arc<InMemoryObjectStore>, config: RepoConfig) -> ConfigRepo {
    init_tracing();
    let local = InMemoryObjectStore::clone_from(Arc::clone(upstream)).unwrap();
    let repo = ConfigRepo::new(Arc::new(local), config).unwrap();
    repo.init().await.unwrap();
    repo
}

fn app1_history() -> Arc<InMemoryObjectStore> {
    let upstream = Arc::new(InMemoryObjectStore::open());
    publish(&upstream, "app1/1.0.0", yml("version: 1.0.0\n"));
    publish(&upstream, "app1/1.0.1", yml("version: 1.0.1\n"));
    publish(&upstream, "app1/6.0.0", yml("version: 6.0.0\n"));
    upstream
}

#[tokio::test]
async fn resolves_the_nearest_lower_version() {
    let repo = repo_over(&app1_history(), open_config()).await;

    assert_eq!(
        repo.apps_versions()["app1"],
        vec!["6.0.0", "1.0.1", "1.0.0"]
    );

    let file = repo.get_file("app1", "5.0.0", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("version: 1.0.1\n"));

    let file = repo.get_file("app1", "10.0.0", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("version: 6.0.0\n"));

    let file = repo.get_file("app1", "1.0.0", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("version: 1.0.0\n"));

    let err = repo.get_file("app1", "0.9.0", "config.yml").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn release_candidates_are_served_only_on_request() {
    let upstream = Arc::new(InMemoryObjectStore::open());
    publish(&upstream, "app1/1.0.0", yml("stable"));
    publish(&upstream, "app1/2.0.0-rc.1", yml("rc"));
    let repo = repo_over(&upstream, open_config()).await;

    let file = repo.get_file("app1", "2.0.0", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("stable"));
    let file = repo.get_file("app1", "2.0.0-rc.1", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("rc"));
}

#[tokio::test]
async fn unknown_application_and_missing_file_are_not_found() {
    let repo = repo_over(&app1_history(), open_config()).await;

    let err = repo.get_file("app2", "1.0.0", "config.yml").await.unwrap_err();
    assert!(matches!(err, RepoError::Resolve(_)));
    assert_eq!(err.class(), ErrorClass::NotFound);

    let err = repo.get_file("app1", "1.0.0", "missing.yml").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn empty_history_has_no_applications() {
    let repo = repo_over(&Arc::new(InMemoryObjectStore::open()), open_config()).await;
    assert!(repo.apps_versions().is_empty());
    let err = repo.resolve("app1", "1.0.0").unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn fetch_without_upstream_changes_is_silent() {
    let upstream = app1_history();
    let repo = repo_over(&upstream, open_config()).await;
    let events = Arc::new(AtomicUsize::new(0));
    {
        let events = Arc::clone(&events);
        repo.add_on_change_handler(move |_| {
            events.fetch_add(1, Ordering::SeqCst);
        });
    }

    let before = repo.catalog();
    let report = repo.fetch().await.unwrap();
    assert!(report.events.is_empty());
    assert!(!report.published);
    assert_eq!(*before, *repo.catalog());
    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert!(repo.last_fetch_time().is_some());
}

#[tokio::test]
async fn changed_snapshot_notifies_handlers_and_matching_watchers() {
    let upstream = app1_history();
    let repo = repo_over(&upstream, open_config()).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        repo.add_on_change_handler(move |event: &ChangeEvent| seen.lock().push(event.clone()));
    }
    let mut low = repo.subscribe("app1", "1.0.0").unwrap();
    let mut high = repo.subscribe("app1", "7.0.0").unwrap();
    let mut other = repo.subscribe("app2", "0.1.0").unwrap();
    assert_eq!(repo.watcher_count(), 3);

    publish(&upstream, "app1/1.0.1", yml("version: 1.0.1\nchanged: true\n"));
    let report = repo.fetch().await.unwrap();

    let expected = ChangeEvent::new("app1", "1.0.1");
    assert_eq!(report.events, vec![expected.clone()]);
    assert_eq!(*seen.lock(), vec![expected.clone()]);
    assert_eq!(low.receiver.try_recv().unwrap(), expected);
    assert!(high.receiver.try_recv().is_err());
    assert!(other.receiver.try_recv().is_err());

    let file = repo.get_file("app1", "1.0.1", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("version: 1.0.1\nchanged: true\n"));

    assert!(repo.unsubscribe(&low.id));
    assert!(!repo.unsubscribe(&low.id));
    assert_eq!(repo.watcher_count(), 2);
}

#[tokio::test]
async fn new_version_is_reported_and_resolvable() {
    let upstream = app1_history();
    let repo = repo_over(&upstream, open_config()).await;

    publish(&upstream, "app1/5.0.0", yml("version: 5.0.0\n"));
    let report = repo.fetch().await.unwrap();
    assert_eq!(report.events, vec![ChangeEvent::new("app1", "5.0.0")]);

    let file = repo.get_file("app1", "5.2.0", "config.yml").await.unwrap();
    assert_eq!(file.as_str(), Some("version: 5.0.0\n"));
}

#[tokio::test]
async fn watch_streams_until_cancelled_and_unregisters() {
    let upstream = app1_history();
    let repo = Arc::new(repo_over(&upstream, open_config()).await);
    let (mut sink, mut stream) = mpsc::channel::<ChangeEvent>(8);
    let cancel = CancellationToken::new();

    let pump = {
        let repo = Arc::clone(&repo);
        let cancel = cancel.clone();
        tokio::spawn(async move { repo.watch("app1", "1.0.0", cancel, &mut sink).await })
    };
    while repo.watcher_count() == 0 {
        tokio::task::yield_now().await;
    }

    publish(&upstream, "app1/6.0.0", yml("version: 6.0.1\n"));
    repo.fetch().await.unwrap();
    assert_eq!(stream.recv().await, Some(ChangeEvent::new("app1", "6.0.0")));

    cancel.cancel();
    assert_eq!(pump.await.unwrap().unwrap(), PumpExit::Cancelled);
    assert_eq!(repo.watcher_count(), 0);
}

#[tokio::test]
async fn watch_rejects_invalid_minimum_version() {
    let repo = repo_over(&app1_history(), open_config()).await;
    let (mut sink, _stream) = mpsc::channel::<ChangeEvent>(1);
    let err = repo
        .watch("app1", "latest", CancellationToken::new(), &mut sink)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert_eq!(repo.watcher_count(), 0);
}

fn merge_history() -> Arc<InMemoryObjectStore> {
    let upstream = Arc::new(InMemoryObjectStore::open());
    publish(
        &upstream,
        "app1/1.0.0",
        Snapshot::new()
            .with_file("config.yml", "version: 1.0.0\ndb:\n  host: localhost\n  port: 5432\n")
            .with_file("dev/config.yml", "environment: dev\ndb:\n  host: dev-db\n")
            .with_file("app1.yml", "name: app1\nlevel: common\n")
            .with_file("app1-dev.yml", "level: dev\n"),
    );
    upstream
}

#[tokio::test]
async fn smart_config_merges_profile_overlays() {
    let repo = repo_over(&merge_history(), open_config()).await;
    let strategy = repo.smart_config_strategy();

    let merged = repo
        .merge_config("app1", "1.0.0", &["dev".to_string()], &strategy)
        .await
        .unwrap();
    assert_eq!(
        merged,
        json!({
            "version": "1.0.0",
            "environment": "dev",
            "db": { "host": "dev-db", "port": 5432 }
        })
    );

    let again = repo
        .merge_config("app1", "1.0.0", &["dev".to_string()], &strategy)
        .await
        .unwrap();
    assert_eq!(merged, again);
}

#[tokio::test]
async fn merge_without_profiles_returns_the_common_file() {
    let repo = repo_over(&merge_history(), open_config()).await;
    let merged = repo
        .merge_config("app1", "1.0.0", &[], &repo.smart_config_strategy())
        .await
        .unwrap();
    assert_eq!(
        merged,
        json!({ "version": "1.0.0", "db": { "host": "localhost", "port": 5432 } })
    );
}

#[tokio::test]
async fn merge_skips_missing_profiles_but_fails_for_unknown_applications() {
    let repo = repo_over(&merge_history(), open_config()).await;
    let merged = repo
        .merge_config("app1", "1.0.0", &["qa".to_string()], &repo.smart_config_strategy())
        .await
        .unwrap();
    assert_eq!(merged["version"], json!("1.0.0"));

    let err = repo
        .merge_config("app9", "1.0.0", &[], &repo.smart_config_strategy())
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn merge_below_every_version_is_empty() {
    let repo = repo_over(&merge_history(), open_config()).await;
    let merged = repo
        .merge_config("app1", "0.5.0", &["dev".to_string()], &repo.smart_config_strategy())
        .await
        .unwrap();
    assert_eq!(merged, json!({}));

    let err = repo.get_file("app1", "0.5.0", "config.yml").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn spring_merge_and_property_sources() {
    let repo = repo_over(&merge_history(), open_config()).await;
    let merged = repo
        .merge_config("app1", "1.0.0", &["dev".to_string()], &repo.spring_strategy())
        .await
        .unwrap();
    assert_eq!(merged, json!({ "name": "app1", "level": "dev" }));

    let sources = repo
        .property_sources("app1", "1.0.0", &["dev".to_string()])
        .await
        .unwrap();
    let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["app1-dev.yml", "app1.yml"]);
    assert_eq!(sources[0].source["level"], json!("dev"));
    assert_eq!(sources[1].source["name"], json!("app1"));
}

fn secured_history(key: &SigningKey) -> Arc<InMemoryObjectStore> {
    let upstream = Arc::new(InMemoryObjectStore::open());
    publish(
        &upstream,
        "app1/1.0.0",
        yml("version: 1.0.0\n").with_file("pub.key", key.verifying_key().to_pem().unwrap()),
    );
    upstream
}

#[tokio::test]
async fn security_disabled_accepts_anything() {
    let key = SigningKey::generate();
    let repo = repo_over(&secured_history(&key), open_config()).await;
    repo.verify_token("app1", "1.0.0", None).await.unwrap();
    repo.verify_token("app1", "1.0.0", Some("garbage")).await.unwrap();
}

#[tokio::test]
async fn tokens_are_checked_against_the_application_key() {
    let key = SigningKey::generate();
    let repo = repo_over(&secured_history(&key), RepoConfig::default()).await;

    let valid = sign_token(&key, b"app1");
    repo.verify_token("app1", "1.0.0", Some(&valid)).await.unwrap();
    repo.verify_token("app1", "1.4.0", Some(&valid)).await.unwrap();

    let err = repo.verify_token("app1", "1.0.0", None).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unauthorized);

    let forged = sign_token(&SigningKey::generate(), b"app1");
    let err = repo
        .verify_token("app1", "1.0.0", Some(&forged))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unauthorized);

    let err = repo
        .verify_token("app2", "1.0.0", Some(&valid))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unauthorized);
}

#[tokio::test]
async fn rotated_key_is_picked_up_after_fetch() {
    let old_key = SigningKey::generate();
    let upstream = secured_history(&old_key);
    let repo = repo_over(&upstream, RepoConfig::default()).await;

    let old_token = sign_token(&old_key, b"app1");
    repo.verify_token("app1", "1.0.0", Some(&old_token))
        .await
        .unwrap();

    let new_key = SigningKey::generate();
    publish(
        &upstream,
        "app1/1.0.0",
        yml("version: 1.0.0\n").with_file("pub.key", new_key.verifying_key().to_pem().unwrap()),
    );
    repo.fetch().await.unwrap();

    let new_token = sign_token(&new_key, b"app1");
    repo.verify_token("app1", "1.0.0", Some(&new_token))
        .await
        .unwrap();
    assert!(repo
        .verify_token("app1", "1.0.0", Some(&old_token))
        .await
        .is_err());
}

#[tokio::test]
async fn malformed_requests_are_rejected_before_resolution() {
    let repo = repo_over(&app1_history(), open_config()).await;
    for (app, version) in [("", "1.0.0"), ("app 1", "1.0.0"), ("app1", ""), ("app1", "1.x")] {
        let err = repo.resolve(app, version).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)), "{app:?}@{version:?}");
        assert_eq!(err.class(), ErrorClass::BadRequest);
    }
}

#[tokio::test(start_paused = true)]
async fn periodic_fetch_picks_up_changes_until_stopped() {
    let upstream = app1_history();
    let repo = repo_over(&upstream, open_config()).await;
    let events = Arc::new(AtomicUsize::new(0));
    {
        let events = Arc::clone(&events);
        repo.add_on_change_handler(move |_| {
            events.fetch_add(1, Ordering::SeqCst);
        });
    }

    repo.start_fetching_every(Duration::from_secs(10)).unwrap();
    assert!(repo.is_fetching());
    assert!(matches!(
        repo.start_fetching_every(Duration::from_secs(10)),
        Err(RepoError::Sync(_))
    ));

    publish(&upstream, "app1/7.0.0", yml("version: 7.0.0\n"));
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert!(repo.last_fetch_time().is_some());

    assert!(repo.stop_fetching().await);
    assert!(!repo.is_fetching());

    publish(&upstream, "app1/8.0.0", yml("version: 8.0.0\n"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn scheduled_failures_reach_error_listeners() {
    let upstream = app1_history();
    init_tracing();
    let local = Arc::new(InMemoryObjectStore::clone_from(Arc::clone(&upstream)).unwrap());
    let repo = ConfigRepo::new(
        local.clone(),
        RepoConfig {
            fetch_interval_secs: Some(5),
            ..open_config()
        },
    )
    .unwrap();
    let failures = Arc::new(AtomicUsize::new(0));
    {
        let failures = Arc::clone(&failures);
        repo.add_error_listener(move |_| {
            failures.fetch_add(1, Ordering::SeqCst);
        });
    }
    repo.init().await.unwrap();
    assert!(repo.is_fetching());

    local.set_remote_reachable(false);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    let err = repo.fetch().await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unavailable);
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    local.set_remote_reachable(true);
    repo.stop_fetching().await;
}
