use std::sync::Arc;
use std::time::Duration;

use jisho_core::{FailureKind, Stage, UpdateStatus};
use tokio::sync::Notify;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::{SAMPLE, service_with};
use crate::service::{BUSY_MESSAGE, CANCELLED_MESSAGE};

fn file_names(dir: &std::path::Path) -> Vec<String> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read_dir
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn not_ready_before_first_update() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", SAMPLE)], |_| {});

    assert!(!service.is_dictionary_ready().await);
    let err = service.search("cat").await.unwrap_err();
    assert!(err.is_not_ready(), "{err}");
}

#[tokio::test]
async fn update_then_search_every_script() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", SAMPLE)], |_| {});

    let report = service.update_dictionary(&CancellationToken::new()).await;
    assert!(report.success, "{}", report.message);
    assert_eq!(report.message, "Dictionary updated: 3 entries");
    assert!(service.is_dictionary_ready().await);
    assert!(matches!(
        *service.subscribe().borrow(),
        UpdateStatus::Succeeded { .. }
    ));

    let cats = service.search("cat").await.unwrap();
    assert!(!cats.is_empty() && cats.len() <= 20);
    assert!(cats.iter().all(|h| !h.primary.is_empty() && !h.short_gloss.is_empty()));
    assert_eq!(cats[0].primary, "猫");

    for query in ["猫", "ねこ", "neko", "ネコ"] {
        let hits = service.search(query).await.unwrap();
        assert_eq!(hits[0].entry.id, "1467640", "query {query}");
    }

    let metadata = service.metadata().await.unwrap();
    assert_eq!(metadata.version, "3.6.1");
    assert_eq!(metadata.entry_count, 3);

    // Downloaded archive and raw JSON are removed after a successful build
    assert_eq!(file_names(&dir.path().join("data")), vec!["jisho.sqlite3"]);
}

#[tokio::test]
async fn keep_artifacts_leaves_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("source.tgz");
    super::write_archive(&archive, &[("jmdict.json", SAMPLE)]);
    let mut config = super::dictionary_config(&dir.path().join("data"));
    config.keep_artifacts = true;
    let service = crate::service::DictionaryService::new(
        config,
        Arc::new(super::LocalFetcher::new(archive)),
    );

    assert!(service.update_dictionary(&CancellationToken::new()).await.success);
    assert_eq!(
        file_names(&dir.path().join("data")),
        vec!["jisho.sqlite3", super::ASSET_NAME, "jmdict.json"]
    );
}

#[tokio::test]
async fn cancelled_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", SAMPLE)], |_| {});
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = service.update_dictionary(&cancel).await;

    assert!(!report.success);
    assert!(report.cancelled);
    assert_eq!(report.message, CANCELLED_MESSAGE);
    assert_eq!(*service.subscribe().borrow(), UpdateStatus::Cancelled);
    assert!(!service.is_dictionary_ready().await);
    assert!(file_names(&dir.path().join("data")).is_empty());
}

#[tokio::test]
async fn cancelled_after_download_leaves_no_generation() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", SAMPLE)], |f| {
        f.cancel_during_download = true;
    });

    let report = service.update_dictionary(&CancellationToken::new()).await;

    assert!(!report.success);
    assert_eq!(report.message, CANCELLED_MESSAGE);
    assert!(!service.is_dictionary_ready().await);
    let leftovers = file_names(&dir.path().join("data"));
    assert!(
        leftovers
            .iter()
            .all(|n| !n.ends_with(".building") && !n.ends_with(".part") && n != "jisho.sqlite3"),
        "{leftovers:?}"
    );
}

#[tokio::test]
async fn ambiguous_archive_fails_with_archive_kind() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(
        dir.path(),
        &[("jmdict.json", SAMPLE), ("jmdict-copy.json", SAMPLE)],
        |_| {},
    );

    let report = service.update_dictionary(&CancellationToken::new()).await;

    assert!(!report.success);
    assert!(report.message.contains("archive error"), "{}", report.message);
    assert!(matches!(
        *service.subscribe().borrow(),
        UpdateStatus::Failed {
            kind: FailureKind::Archive,
            ..
        }
    ));
    assert!(!service.is_dictionary_ready().await);
}

#[tokio::test]
async fn malformed_dataset_fails_with_parse_kind() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", r#"{"version":"1"}"#)], |_| {});

    let report = service.update_dictionary(&CancellationToken::new()).await;

    assert!(!report.success);
    assert!(matches!(
        *service.subscribe().borrow(),
        UpdateStatus::Failed {
            kind: FailureKind::Parse,
            ..
        }
    ));
}

#[tokio::test]
async fn concurrent_update_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let service = Arc::new(service_with(dir.path(), &[("jmdict.json", SAMPLE)], |f| {
        f.gate = Some(Arc::clone(&gate));
    }));

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.update_dictionary(&CancellationToken::new()).await }
    });

    // Wait until the first update is parked in the resolve stage
    let mut rx = service.subscribe();
    timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| matches!(s, UpdateStatus::Running { stage: Stage::Resolving, .. })),
    )
    .await
    .unwrap()
    .unwrap();

    let second = service.update_dictionary(&CancellationToken::new()).await;
    assert!(!second.success);
    assert!(!second.cancelled);
    assert_eq!(second.message, BUSY_MESSAGE);

    gate.notify_one();
    let first = timeout(Duration::from_secs(30), first).await.unwrap().unwrap();
    assert!(first.success, "{}", first.message);
}

#[tokio::test]
async fn progress_never_goes_backwards_within_a_stage() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(service_with(dir.path(), &[("jmdict.json", SAMPLE)], |_| {}));

    let mut rx = service.subscribe();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        loop {
            let status = rx.borrow_and_update().clone();
            let terminal = status.is_terminal();
            seen.push(status);
            if terminal || rx.changed().await.is_err() {
                return seen;
            }
        }
    });

    assert!(service.update_dictionary(&CancellationToken::new()).await.success);
    let seen = timeout(Duration::from_secs(5), observer).await.unwrap().unwrap();

    let mut last: Option<(Stage, f64)> = None;
    for status in &seen {
        if let UpdateStatus::Running { stage, progress } = status {
            if let Some((last_stage, last_progress)) = last {
                if last_stage == *stage {
                    assert!(*progress >= last_progress, "{seen:?}");
                }
            }
            last = Some((*stage, *progress));
        }
    }
    assert!(matches!(seen.last(), Some(UpdateStatus::Succeeded { .. })));
}

#[tokio::test]
async fn rebuild_swaps_generation_without_breaking_readers() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(dir.path(), &[("jmdict.json", SAMPLE)], |_| {});

    assert!(service.update_dictionary(&CancellationToken::new()).await.success);
    let before = service.search("猫").await.unwrap();

    assert!(service.update_dictionary(&CancellationToken::new()).await.success);
    let after = service.search("猫").await.unwrap();

    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].entry, after[0].entry);
    assert_eq!(service.metadata().await.unwrap().entry_count, 3);
}
