mod common;

use common::{flat_records, write_file};
use mvcopy::resolve::{
    DirectoryListResolver, JobFileResolver, Resolver, ResumePoint, read_jobfile,
    read_resume_point, remove_resume_point, write_jobfile, write_resume_point,
};
use std::fs;
use std::path::PathBuf;

// --- DirectoryListResolver ---

#[test]
fn test_directory_list_sorted_and_indexed() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    write_file(&src.join("b.txt"), 3);
    write_file(&src.join("a/x.txt"), 5);
    write_file(&src.join("c/d/y.txt"), 7);

    let records = DirectoryListResolver::new(vec![src.clone()], &out)
        .resolve()
        .unwrap();
    let relpaths: Vec<PathBuf> = records.iter().map(|r| r.relpath.clone()).collect();
    assert_eq!(
        relpaths,
        vec![
            PathBuf::from("a/x.txt"),
            PathBuf::from("b.txt"),
            PathBuf::from("c/d/y.txt")
        ]
    );
    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.index, i);
        assert_eq!(r.dst, out.join(&r.relpath));
        assert_eq!(r.src, src.join(&r.relpath));
    }
    assert_eq!(
        records.iter().map(|r| r.bytes).collect::<Vec<_>>(),
        vec![5, 3, 7]
    );
}

#[test]
fn test_directory_list_keeps_dotfiles_and_os_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    for name in ["a.txt", "._photo.jpg", "Desktop.ini", ".directory", ".DS_Store", "Thumbs.db"] {
        write_file(&src.join(name), 2);
    }

    let records = DirectoryListResolver::new(vec![src.clone()], tmp.path().join("out"))
        .resolve()
        .unwrap();
    let mut names: Vec<String> = records
        .iter()
        .map(|r| r.relpath.to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![".DS_Store", "._photo.jpg", ".directory", "Desktop.ini", "Thumbs.db", "a.txt"]
    );
}

#[test]
fn test_directory_list_multiple_sources_sorted_by_src() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    write_file(&tmp.path().join("zeta/1.txt"), 1);
    write_file(&tmp.path().join("alpha/2.txt"), 1);

    let records = DirectoryListResolver::new(
        vec![tmp.path().join("zeta"), tmp.path().join("alpha")],
        &out,
    )
    .resolve()
    .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].src, tmp.path().join("alpha/2.txt"));
    assert_eq!(records[0].index, 0);
    assert_eq!(records[1].src, tmp.path().join("zeta/1.txt"));
    assert_eq!(records[1].index, 1);
}

#[test]
fn test_directory_list_single_file_source() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("notes.md");
    write_file(&file, 12);
    let records = DirectoryListResolver::new(vec![file], tmp.path().join("out"))
        .resolve()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].relpath, PathBuf::from("notes.md"));
    assert_eq!(records[0].dst, tmp.path().join("out/notes.md"));
}

#[test]
fn test_directory_list_missing_source() {
    let tmp = tempfile::tempdir().unwrap();
    let resolver =
        DirectoryListResolver::new(vec![tmp.path().join("nope")], tmp.path().join("out"));
    assert!(resolver.resolve().is_err());
}

#[test]
fn test_resolve_from_device_start() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    for name in ["a", "b", "c"] {
        write_file(&src.join(name), 1);
    }
    let records = DirectoryListResolver::new(vec![src], tmp.path().join("out"))
        .resolve_from(1)
        .unwrap();
    assert_eq!(
        records.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

// --- job file ---

#[test]
fn test_jobfile_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let records = flat_records(&tmp.path().join("src"), &tmp.path().join("out"), 3, 4);
    let path = tmp.path().join("state/job.json");
    write_jobfile(&path, &records).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), records.len() + 2);
    assert!(!tmp.path().join("state/job.json.tmp").exists());
    assert_eq!(JobFileResolver::new(&path).resolve().unwrap(), records);
}

#[test]
fn test_jobfile_rejects_gaps() {
    let tmp = tempfile::tempdir().unwrap();
    let mut records = flat_records(&tmp.path().join("src"), &tmp.path().join("out"), 3, 4);
    records[2].index = 5;
    let path = tmp.path().join("job.json");
    write_jobfile(&path, &records).unwrap();
    assert!(read_jobfile(&path).is_err());
}

#[test]
fn test_jobfile_missing() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(
        JobFileResolver::new(tmp.path().join("none.json"))
            .resolve()
            .is_err()
    );
}

// --- index file ---

#[test]
fn test_resume_point_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("index");
    assert_eq!(read_resume_point(&path).unwrap(), None);

    let point = ResumePoint {
        device_start_index: 3,
        next_index: 8,
        errors: vec![4, 6],
    };
    write_resume_point(&path, &point).unwrap();
    assert_eq!(read_resume_point(&path).unwrap(), Some(point));

    remove_resume_point(&path).unwrap();
    assert!(!path.exists());
    remove_resume_point(&path).unwrap();
}

#[test]
fn test_resume_point_without_errors_field() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("index");
    fs::write(&path, r#"{"device_start_index":1,"next_index":5}"#).unwrap();
    let point = read_resume_point(&path).unwrap().unwrap();
    assert_eq!(point.next_index, 5);
    assert!(point.errors.is_empty());
}

#[test]
fn test_resume_point_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("index");
    fs::write(&path, "not json").unwrap();
    assert!(read_resume_point(&path).is_err());
}
