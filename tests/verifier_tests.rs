mod common;

use common::{VecResolver, flat_records, write_file};
use mvcopy::resolve::write_jobfile;
use mvcopy::{CopyOptions, Verifier, verify_files};

// --- Verifier ---

#[test]
fn test_verify_reports_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let records = flat_records(&tmp.path().join("src"), &out, 3, 1024);
    // destinations written after sources, so they are not older
    write_file(&records[0].dst, 1024);
    write_file(&records[2].dst, 1024);

    let options = CopyOptions {
        jobfile: tmp.path().join("job.json"),
        ..CopyOptions::with_output(&out)
    };
    write_jobfile(&options.jobfile, &records).unwrap();

    let result = verify_files(&options, 0, 3).unwrap();
    assert_eq!(result.missing_indexes, vec![1]);
    assert!(result.different_indexes.is_empty());
    assert_eq!(result.copied_bytes, 2048);
    assert_eq!(result.backup_bytes, 2048);
    assert!(!result.valid());
}

#[test]
fn test_verify_reports_different_and_honors_range() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let records = flat_records(&tmp.path().join("src"), &out, 4, 100);
    write_file(&records[1].dst, 100);
    write_file(&records[2].dst, 10);
    write_file(&records[3].dst, 10);

    let options = CopyOptions::with_output(&out);
    let verifier = Verifier::new(Box::new(VecResolver(records)), options);
    let result = verifier.verify(1, 3).unwrap();
    assert!(result.missing_indexes.is_empty());
    assert_eq!(result.different_indexes, vec![2]);
    assert_eq!(result.copied_bytes, 200);
    assert_eq!(result.backup_bytes, 120);
}

#[test]
fn test_verify_valid_volume() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let records = flat_records(&tmp.path().join("src"), &out, 2, 64);
    for r in &records {
        write_file(&r.dst, 64);
    }
    let verifier = Verifier::new(Box::new(VecResolver(records)), CopyOptions::with_output(&out));
    let result = verifier.verify(0, 2).unwrap();
    assert!(result.valid());
    assert_eq!(result.copied_bytes, 128);
}
