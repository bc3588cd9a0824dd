mod common;

use std::fs;
use std::sync::{Arc, Mutex};

use common::{make_indexer, points_for, test_config, write_note, StubEmbedder, FAIL_MARKER};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vault_indexer::VaultIndexer;
use vault_store::{MemoryStore, VectorStore};

fn three_note_vault() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_note(
        dir.path(),
        "alpha.md",
        "# Alpha\n\nNotes about ownership and borrowing in systems programming.\n",
    );
    write_note(
        dir.path(),
        "beta.md",
        "# Beta\n\nGarden journal with tomato seedlings and watering schedules.\n",
    );
    write_note(
        dir.path(),
        "sub/gamma.md",
        "# Gamma\n\nTravel checklist for the northern coast hiking trip.\n",
    );
    dir
}

#[tokio::test]
async fn first_run_indexes_second_run_skips() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));

    let first = indexer.index(None, false).await.unwrap();
    assert_eq!(first.files_processed, 3);
    assert_eq!(first.files_skipped, 0);
    assert!(first.chunks_added >= 3);
    assert!(first.errors.is_empty());

    let stats = store.collection_stats("test-vault").await.unwrap();
    assert_eq!(stats.points, first.chunks_added);

    let second = indexer.index(None, false).await.unwrap();
    assert_eq!(second.files_processed, 0);
    assert_eq!(second.files_skipped, 3);
    assert_eq!(second.chunks_added, 0);

    let stats = store.collection_stats("test-vault").await.unwrap();
    assert_eq!(stats.points, first.chunks_added);
}

#[tokio::test]
async fn rewriting_identical_bytes_does_not_reindex() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    // Same bytes, fresh mtime.
    let content = fs::read(vault.path().join("alpha.md")).unwrap();
    fs::write(vault.path().join("alpha.md"), content).unwrap();

    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.files_skipped, 3);
}

#[tokio::test]
async fn one_byte_change_reindexes_exactly_that_file() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    let first = indexer.index(None, false).await.unwrap();

    let old_alpha_points = points_for(&store, "alpha.md").await;
    write_note(
        vault.path(),
        "alpha.md",
        "# Alpha\n\nNotes about ownership and borrowing in systems programming!\n",
    );

    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.files_skipped, 2);
    assert_eq!(report.chunks_removed, old_alpha_points);

    // No stale points left behind.
    let stats = store.collection_stats("test-vault").await.unwrap();
    assert_eq!(
        stats.points,
        first.chunks_added - old_alpha_points + report.chunks_added
    );
}

#[tokio::test]
async fn force_reindexes_unchanged_files() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    let report = indexer.index(None, true).await.unwrap();
    assert_eq!(report.files_processed, 3);
    assert_eq!(report.files_skipped, 0);
    assert!(report.chunks_removed > 0);
}

#[tokio::test]
async fn explicit_file_list_limits_the_working_set() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    write_note(vault.path(), "alpha.md", "# Alpha\n\nRewritten alpha body.\n");
    write_note(vault.path(), "beta.md", "# Beta\n\nRewritten beta body.\n");

    let narrowed = indexer
        .index(Some(&["alpha.md".to_string()]), false)
        .await
        .unwrap();
    assert_eq!(narrowed.files_processed, 1);
    assert_eq!(narrowed.files_skipped, 0);

    // beta.md is still stale and gets picked up by the next full run.
    let full = indexer.index(None, false).await.unwrap();
    assert_eq!(full.files_processed, 1);
    assert_eq!(full.files_skipped, 2);
}

#[tokio::test]
async fn explicitly_listed_files_bypass_extension_and_exclusion_rules() {
    let dir = TempDir::new().unwrap();
    write_note(
        dir.path(),
        "note.txt",
        "Plain text file outside the include list.\n",
    );
    write_note(dir.path(), "_drafts/wip.md", "# WIP\n\nExcluded by pattern.\n");

    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(dir.path(), Arc::clone(&store));

    // A full run sees neither file.
    let full = indexer.index(None, false).await.unwrap();
    assert_eq!(full.files_processed, 0);

    // Naming them explicitly indexes both.
    let report = indexer
        .index(
            Some(&["note.txt".to_string(), "_drafts/wip.md".to_string()]),
            false,
        )
        .await
        .unwrap();
    assert_eq!(report.files_processed, 2);
    assert!(report.errors.is_empty());
    assert!(points_for(&store, "note.txt").await > 0);
    assert!(points_for(&store, "_drafts/wip.md").await > 0);
}

#[tokio::test]
async fn unresolvable_explicit_paths_are_dropped() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));

    let report = indexer
        .index(
            Some(&["alpha.md".to_string(), "missing.md".to_string()]),
            false,
        )
        .await
        .unwrap();
    assert_eq!(report.files_processed, 1);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn deletion_reconciliation_only_on_full_runs() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    fs::remove_file(vault.path().join("beta.md")).unwrap();

    // Narrowed run: the deletion must not be reconciled.
    let narrowed = indexer
        .index(Some(&["alpha.md".to_string()]), false)
        .await
        .unwrap();
    assert_eq!(narrowed.files_deleted, 0);
    assert!(points_for(&store, "beta.md").await > 0);

    // Full run purges the dead file.
    let full = indexer.index(None, false).await.unwrap();
    assert_eq!(full.files_deleted, 1);
    assert!(full.chunks_removed > 0);
    assert_eq!(points_for(&store, "beta.md").await, 0);
}

#[tokio::test]
async fn one_bad_file_out_of_ten_is_isolated() {
    let dir = TempDir::new().unwrap();
    for i in 0..9 {
        write_note(
            dir.path(),
            &format!("note-{i}.md"),
            &format!("# Note {i}\n\nBody text for note number {i}.\n"),
        );
    }
    write_note(
        dir.path(),
        "bad.md",
        &format!("# Bad\n\nThis one contains {FAIL_MARKER} in its body.\n"),
    );

    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(dir.path(), Arc::clone(&store));

    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 9);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("bad.md:"));

    let status = indexer.status().await.unwrap();
    assert_eq!(status.files_indexed, 9);

    // Fixing the file picks it up on the next run; the nine stay skipped.
    write_note(dir.path(), "bad.md", "# Bad\n\nNow perfectly fine.\n");
    let retry = indexer.index(None, false).await.unwrap();
    assert_eq!(retry.files_processed, 1);
    assert_eq!(retry.files_skipped, 9);
    assert!(retry.errors.is_empty());
}

#[tokio::test]
async fn empty_file_is_tracked_but_stores_nothing() {
    let dir = TempDir::new().unwrap();
    write_note(dir.path(), "empty.md", "");

    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(dir.path(), Arc::clone(&store));

    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.chunks_added, 0);

    let second = indexer.index(None, false).await.unwrap();
    assert_eq!(second.files_skipped, 1);
}

#[tokio::test]
async fn delete_file_purges_points_and_ledger() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    let removed = indexer.delete_file("alpha.md").await.unwrap();
    assert!(removed > 0);
    assert_eq!(points_for(&store, "alpha.md").await, 0);

    let status = indexer.status().await.unwrap();
    assert_eq!(status.files_indexed, 2);

    assert_eq!(indexer.delete_file("never-indexed.md").await.unwrap(), 0);
}

#[tokio::test]
async fn clear_drops_collection_and_resets_ledger() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    indexer.clear().await.unwrap();

    let status = indexer.status().await.unwrap();
    assert_eq!(status.files_indexed, 0);
    assert_eq!(status.chunks_tracked, 0);
    assert_eq!(status.points_stored, 0);

    // Everything comes back on the next run.
    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 3);
}

#[tokio::test]
async fn malformed_ledger_forces_full_reindex() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    indexer.index(None, false).await.unwrap();

    fs::write(test_config(vault.path()).state_path(), b"{broken").unwrap();

    let report = indexer.index(None, false).await.unwrap();
    assert_eq!(report.files_processed, 3);
    assert_eq!(report.files_skipped, 0);
}

#[tokio::test]
async fn status_merges_ledger_and_store_counters() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());
    let indexer = make_indexer(vault.path(), Arc::clone(&store));
    let report = indexer.index(None, false).await.unwrap();

    let status = indexer.status().await.unwrap();
    assert_eq!(status.collection_name, "test-vault");
    assert_eq!(status.model_name, "stub-model");
    assert_eq!(status.files_indexed, 3);
    assert_eq!(status.chunks_tracked, report.chunks_added);
    assert_eq!(status.points_stored, report.chunks_added);
    assert!(status.last_indexed_unix_ms.is_some());
}

#[tokio::test]
async fn progress_callback_sees_every_working_set_file() {
    let vault = three_note_vault();
    let store = Arc::new(MemoryStore::new());

    let seen: Arc<Mutex<Vec<(String, usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let indexer = VaultIndexer::new(
        test_config(vault.path()),
        Arc::new(StubEmbedder),
        store.clone(),
    )
    .unwrap()
    .with_progress(Box::new(move |path, position, total| {
        sink.lock()
            .unwrap()
            .push((path.to_string(), position, total));
    }));

    indexer.index(None, false).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].1, 1);
    assert_eq!(seen[2], ("sub/gamma.md".to_string(), 3, 3));
}
