//! Helper tests: size parsing, staleness, disk-full classification, paths, config and prompt.

mod common;

use common::write_file;
use filetime::{FileTime, set_file_mtime};
use mvcopy::copier::{FsTransfer, Transfer, TransferOutcome};
use mvcopy::engine::filesystem::{directory_size, remove_empty_dirs};
use mvcopy::engine::tools::abbreviate_path;
use mvcopy::engine::{files_different, hash_file, path_relative_to, size_to_bytes};
use mvcopy::utils::mvcopy_toml::{apply_file_to_opts, parse_mvcopy_toml};
use mvcopy::utils::{PollConsts, Prompt, ScriptedPrompt, SwapReply, parse_swap_reply, setup_logging};
use mvcopy::volume::{POSIX_DISKFULL_ERRNO, is_device_full_error, nearest_existing};
use mvcopy::{ComparePolicy, CopyOptions, CopyRecord, ReconcilerKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

// --- size_to_bytes ---

#[test]
fn test_size_units() {
    assert_eq!(size_to_bytes("5M").unwrap(), 5_000_000);
    assert_eq!(size_to_bytes("10GB").unwrap(), 10_000_000_000);
    assert_eq!(size_to_bytes("6K").unwrap(), 6_000);
    assert_eq!(size_to_bytes("8B").unwrap(), 8);
    assert_eq!(size_to_bytes("8").unwrap(), 8);
    assert_eq!(size_to_bytes("2tb").unwrap(), 2_000_000_000_000);
}

#[test]
fn test_size_rejects_garbage() {
    assert!(size_to_bytes("5X").is_err());
    assert!(size_to_bytes("MB").is_err());
    assert!(size_to_bytes("").is_err());
}

// --- files_different ---

#[test]
fn test_different_when_source_newer() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, dst) = (tmp.path().join("s"), tmp.path().join("d"));
    write_file(&src, 10);
    write_file(&dst, 10);
    set_mtime(&src, 2_000_000);
    set_mtime(&dst, 1_000_000);
    assert!(files_different(&src, &dst, &ComparePolicy::default()).unwrap());

    let no_mtime = ComparePolicy {
        mtime: false,
        ..ComparePolicy::default()
    };
    assert!(!files_different(&src, &dst, &no_mtime).unwrap());
}

#[test]
fn test_not_different_when_destination_newer() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, dst) = (tmp.path().join("s"), tmp.path().join("d"));
    write_file(&src, 10);
    write_file(&dst, 10);
    set_mtime(&src, 1_000_000);
    set_mtime(&dst, 2_000_000);
    assert!(!files_different(&src, &dst, &ComparePolicy::default()).unwrap());
}

#[test]
fn test_different_sizes() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, dst) = (tmp.path().join("s"), tmp.path().join("d"));
    write_file(&src, 10);
    write_file(&dst, 11);
    set_mtime(&src, 1_000_000);
    set_mtime(&dst, 1_000_000);
    assert!(files_different(&src, &dst, &ComparePolicy::default()).unwrap());

    let none = ComparePolicy {
        mtime: false,
        size: false,
        checksum: false,
    };
    assert!(!files_different(&src, &dst, &none).unwrap());
}

#[test]
fn test_different_checksum() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, dst) = (tmp.path().join("s"), tmp.path().join("d"));
    fs::write(&src, "abcd").unwrap();
    fs::write(&dst, "abce").unwrap();
    set_mtime(&src, 1_000_000);
    set_mtime(&dst, 1_000_000);
    assert!(!files_different(&src, &dst, &ComparePolicy::default()).unwrap());

    let checksum = ComparePolicy {
        checksum: true,
        ..ComparePolicy::default()
    };
    assert!(files_different(&src, &dst, &checksum).unwrap());
    assert_ne!(hash_file(&src, 4).unwrap(), hash_file(&dst, 4).unwrap());
}

// --- FsTransfer ---

#[test]
fn test_transfer_copies_and_skips() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src/deep/file.txt");
    write_file(&src, 32);
    set_mtime(&src, 1_500_000);
    let record = CopyRecord {
        src: src.clone(),
        dst: tmp.path().join("out/deep/file.txt"),
        relpath: PathBuf::from("deep/file.txt"),
        bytes: 32,
        index: 0,
    };
    let transfer = FsTransfer::default();
    assert_eq!(transfer.transfer(&record).unwrap(), TransferOutcome::Copied);
    let meta = fs::metadata(&record.dst).unwrap();
    assert_eq!(meta.len(), 32);
    assert_eq!(FileTime::from_last_modification_time(&meta).unix_seconds(), 1_500_000);

    assert_eq!(transfer.transfer(&record).unwrap(), TransferOutcome::Skipped);

    write_file(&src, 40);
    assert_eq!(transfer.transfer(&record).unwrap(), TransferOutcome::Copied);
    assert_eq!(fs::metadata(&record.dst).unwrap().len(), 40);
}

#[test]
fn test_transfer_missing_source_is_not_device_full() {
    let tmp = tempfile::tempdir().unwrap();
    let record = CopyRecord {
        src: tmp.path().join("gone"),
        dst: tmp.path().join("out/gone"),
        relpath: PathBuf::from("gone"),
        bytes: 1,
        index: 0,
    };
    let err = FsTransfer::default().transfer(&record).unwrap_err();
    assert!(!is_device_full_error(&err));
}

// --- is_device_full_error ---

#[test]
fn test_device_full_classification() {
    assert!(is_device_full_error(&io::Error::from(io::ErrorKind::StorageFull)));
    assert!(!is_device_full_error(&io::Error::from(io::ErrorKind::PermissionDenied)));
    assert!(!is_device_full_error(&io::Error::other("boom")));
}

#[cfg(unix)]
#[test]
fn test_device_full_errno() {
    assert!(is_device_full_error(&io::Error::from_raw_os_error(POSIX_DISKFULL_ERRNO)));
    assert!(!is_device_full_error(&io::Error::from_raw_os_error(2)));
}

#[test]
fn test_nearest_existing_walks_up() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("a/b/c");
    assert_eq!(nearest_existing(&missing), tmp.path());
}

// --- directory helpers ---

#[test]
fn test_directory_size_and_cleanup() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    assert_eq!(directory_size(&root), 0);
    write_file(&root.join("a.bin"), 100);
    write_file(&root.join("b.bin"), 50);
    assert_eq!(directory_size(&root), 150);

    fs::create_dir_all(root.join("x/y/z")).unwrap();
    write_file(&root.join("keep/file"), 1);
    assert_eq!(remove_empty_dirs(&root).unwrap(), 3);
    assert!(root.join("keep/file").is_file());
    assert!(!root.join("x").exists());
}

// --- path helpers ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/foo/bar/baz/qux");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("baz/qux"))
    );
    assert_eq!(path_relative_to(Path::new("/other"), &base), None);
}

#[test]
fn test_abbreviate_path() {
    assert_eq!(abbreviate_path(Path::new("short.txt"), 50), "short.txt");
    let long = "d/".repeat(40) + "file.txt";
    let shown = abbreviate_path(Path::new(&long), 10);
    assert_eq!(shown, "...d/file.txt");
}

// --- CopyOptions ---

#[test]
fn test_options_validate() {
    assert!(CopyOptions::default().validate().is_err());
    assert!(CopyOptions::with_output("/backup").validate().is_ok());
    let no_workers = CopyOptions {
        num_workers: 0,
        ..CopyOptions::with_output("/backup")
    };
    assert!(no_workers.validate().is_err());
    let reversed = CopyOptions {
        device_start_index: 3,
        start_index: 1,
        ..CopyOptions::with_output("/backup")
    };
    assert!(reversed.validate().is_err());
}

// --- .mvcopy.toml ---

#[test]
fn test_toml_applies_settings() {
    let file = parse_mvcopy_toml(
        r#"
[settings]
output = "/mnt/backup"
padding = "5M"
workers = 2
checksum = true
mtime = false
delete_all = true
"#,
    )
    .unwrap();
    let mut opts = CopyOptions::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.output, PathBuf::from("/mnt/backup"));
    assert_eq!(opts.device_padding, 5_000_000);
    assert_eq!(opts.num_workers, 2);
    assert!(opts.compare.checksum);
    assert!(!opts.compare.mtime);
    assert!(opts.compare.size);
    assert_eq!(opts.reconciler, ReconcilerKind::DeleteAll);
}

#[test]
fn test_toml_empty_and_invalid() {
    let file = parse_mvcopy_toml("").unwrap();
    let mut opts = CopyOptions::with_output("/x");
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.output, PathBuf::from("/x"));
    assert!(parse_mvcopy_toml("[settings]\nworkers = \"many\"").is_err());
}

// --- prompt ---

#[test]
fn test_swap_replies() {
    assert_eq!(parse_swap_reply("c"), Some(SwapReply::Continue));
    assert_eq!(parse_swap_reply("C"), Some(SwapReply::Continue));
    assert_eq!(parse_swap_reply("q"), Some(SwapReply::Abort));
    assert_eq!(parse_swap_reply("Q"), Some(SwapReply::Abort));
    assert_eq!(parse_swap_reply("yes"), None);
    assert_eq!(parse_swap_reply(""), None);
}

#[test]
fn test_scripted_prompt() {
    let mut prompt = ScriptedPrompt::new(["x", "c"]);
    assert_eq!(prompt.input("?").unwrap(), Some("x".to_string()));
    assert_eq!(prompt.input("?").unwrap(), Some("c".to_string()));
    assert_eq!(prompt.input("?").unwrap(), None);
    assert_eq!(prompt.asked(), 3);
}

#[test]
fn test_join_timeout_is_bounded() {
    assert!(PollConsts::JOIN_TIMEOUT >= Duration::from_secs(1));
    assert!(PollConsts::JOIN_TIMEOUT <= Duration::from_secs(60));
}

#[test]
fn test_setup_logging_twice() {
    setup_logging(false);
    setup_logging(true);
    log::warn!("logger still usable after a second setup");
}
