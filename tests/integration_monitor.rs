use media_renamer::core::monitor::{FileEventKind, FolderMonitor, MonitorStatus, WatchedFolder};
use media_renamer::core::naming::RenameConfig;
use media_renamer::error::WatchError;
use media_renamer::events::MonitorEvent;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

/// Wait for the first `Renamed` event
fn wait_for_rename(events: &crossbeam_channel::Receiver<MonitorEvent>) -> (PathBuf, PathBuf) {
    let (renamed, _) = wait_for_rename_observing(events);
    renamed
}

/// Wait for the first `Renamed` event, also returning what was observed
/// before it
fn wait_for_rename_observing(
    events: &crossbeam_channel::Receiver<MonitorEvent>,
) -> ((PathBuf, PathBuf), Vec<(FileEventKind, PathBuf)>) {
    let deadline = Instant::now() + WAIT;
    let mut observed = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(MonitorEvent::Renamed { from, to }) => return ((from, to), observed),
            Ok(MonitorEvent::FileObserved(e)) => observed.push((e.kind, e.path)),
            Ok(_) => continue,
            Err(_) => panic!("no rename within {:?}", WAIT),
        }
    }
}

fn files_processed(monitor: &FolderMonitor) -> usize {
    match monitor.status() {
        MonitorStatus::Active {
            files_processed, ..
        } => files_processed,
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_monitor_renames_new_arrivals() {
    let temp = TempDir::new().unwrap();
    // Some platforms report canonical paths
    let inbox = temp.path().canonicalize().unwrap();

    let mut monitor = FolderMonitor::on_filesystem();
    let events = monitor.subscribe_events();
    monitor
        .start(WatchedFolder::new(&inbox, RenameConfig::new("inbox_")).with_pattern("IMG_*.jpg"))
        .unwrap();

    fs::write(inbox.join("notes.txt"), b"ignored").unwrap();
    fs::write(inbox.join("IMG_0042.jpg"), b"photo").unwrap();

    let (from, to) = wait_for_rename(&events);
    assert_eq!(from.file_name().unwrap(), "IMG_0042.jpg");
    assert_eq!(to.file_name().unwrap(), "inbox_001.jpg");
    assert_eq!(fs::read(inbox.join("inbox_001.jpg")).unwrap(), b"photo");
    assert!(inbox.join("notes.txt").exists());

    match monitor.status() {
        MonitorStatus::Active {
            folder_path,
            files_processed,
        } => {
            assert_eq!(folder_path, inbox);
            assert!(files_processed >= 1);
        }
        other => panic!("unexpected status {:?}", other),
    }

    monitor.stop();
    assert_eq!(monitor.status(), MonitorStatus::Inactive);
}

#[test]
fn test_monitor_leaves_new_sub_folders_alone() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().canonicalize().unwrap();

    let mut monitor = FolderMonitor::on_filesystem();
    let events = monitor.subscribe_events();
    monitor
        .start(WatchedFolder::new(&inbox, RenameConfig::new("inbox_")))
        .unwrap();

    fs::create_dir(inbox.join("Holiday Album")).unwrap();
    fs::write(inbox.join("a.jpg"), b"photo").unwrap();

    let (from, to) = wait_for_rename(&events);
    assert_eq!(from.file_name().unwrap(), "a.jpg");
    assert_eq!(to.file_name().unwrap(), "inbox_001.jpg");
    assert!(inbox.join("Holiday Album").is_dir());
    assert_eq!(files_processed(&monitor), 1);

    monitor.stop();
}

#[test]
fn test_monitor_renames_a_new_file_reusing_a_produced_name() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().canonicalize().unwrap();

    let mut monitor = FolderMonitor::on_filesystem();
    let events = monitor.subscribe_events();
    monitor
        .start(WatchedFolder::new(&inbox, RenameConfig::new("inbox_")))
        .unwrap();

    fs::write(inbox.join("a.jpg"), b"first").unwrap();
    let (_, to) = wait_for_rename(&events);
    assert_eq!(to, inbox.join("inbox_001.jpg"));

    fs::remove_file(inbox.join("inbox_001.jpg")).unwrap();
    fs::write(inbox.join("inbox_001.jpg"), b"second").unwrap();

    let ((from, to), observed) = wait_for_rename_observing(&events);
    assert_eq!(from, inbox.join("inbox_001.jpg"));
    assert_eq!(to, inbox.join("inbox_002.jpg"));
    assert_eq!(fs::read(&to).unwrap(), b"second");
    assert_eq!(files_processed(&monitor), 2);

    // The first rename's own echo never shows up as a move
    let first = inbox.join("inbox_001.jpg");
    assert!(!observed
        .iter()
        .any(|(kind, path)| *kind == FileEventKind::Moved && *path == first));

    monitor.stop();
}

#[test]
fn test_monitor_rejects_missing_folder() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("not-there");

    let mut monitor = FolderMonitor::on_filesystem();
    let statuses = monitor.subscribe_status();

    let result = monitor.start(WatchedFolder::new(&missing, RenameConfig::default()));

    assert!(matches!(result, Err(WatchError::PathNotFound(_))));
    assert!(matches!(monitor.status(), MonitorStatus::Error { .. }));
    assert!(statuses.try_iter().all(|s| !s.is_active()));
}

#[test]
fn test_monitor_rejects_file_as_folder() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("a.jpg");
    fs::write(&file, b"x").unwrap();

    let mut monitor = FolderMonitor::on_filesystem();
    let result = monitor.start(WatchedFolder::new(&file, RenameConfig::default()));

    assert!(matches!(result, Err(WatchError::NotADirectory(_))));
}
