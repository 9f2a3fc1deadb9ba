//! # End-to-End Pipeline Tests
//!
//! Learn real files into a directory store, compile, and identify a third
//! file, through the `Tracker` facade and through the `printrack` binary.

use printrack::{FormatTag, Tracker, TrackerConfig, TrackerError};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Two 20-byte samples that differ only at offset 10.
fn abc_samples() -> (Vec<u8>, Vec<u8>) {
    let first = b"ABC\x01header--Xtrailer".to_vec();
    let mut second = first.clone();
    second[10] = b'Y';
    (first, second)
}

fn config_for(root: &Path) -> TrackerConfig {
    TrackerConfig {
        store_root: root.to_path_buf(),
        scan_threads: 2,
        ..TrackerConfig::default()
    }
}

#[test]
fn test_learn_compile_identify() {
    let t = Instant::now();

    let dir = tempfile::tempdir().expect("tempdir");
    let (first, second) = abc_samples();
    assert_eq!(first.len(), 20);
    fs::write(dir.path().join("sample1.abc"), &first).expect("write");
    fs::write(dir.path().join("sample2.abc"), &second).expect("write");
    fs::write(dir.path().join("other.xyz"), b"#!xyz\x00\x00\x00 unrelated body").expect("write");

    let mut tracker = Tracker::open(&config_for(dir.path()));
    let seeded = tracker.learn_file(&dir.path().join("sample1.abc"), None).expect("learn");
    assert!(seeded.seeded);
    let second_report = tracker.learn_file(&dir.path().join("sample2.abc"), None).expect("learn");
    assert!(!second_report.seeded);
    assert_eq!(second_report.newly_wildcarded, 2);
    tracker.learn_file(&dir.path().join("other.xyz"), None).expect("learn");

    let abc = FormatTag::new("abc").expect("tag");
    let compiled = tracker.compile(&abc).expect("compile");
    assert_eq!(compiled.forward_records, 2);
    assert_eq!(compiled.reverse_records, 2);
    tracker.compile(&FormatTag::new("xyz").expect("tag")).expect("compile");
    assert!(dir.path().join("prints/abc.print").is_file());

    // A third file with its own byte at offset 10 still matches every record.
    let mut third = first.clone();
    third[10] = b'Z';
    let unknown = dir.path().join("mystery");
    fs::write(&unknown, &third).expect("write");

    let ranking = tracker.identify_file(&unknown).expect("identify");
    let best = ranking.best().expect("abc ranks");
    assert_eq!(best.format, abc);
    assert_eq!(best.total_records, 4);
    assert_eq!(best.percent, 100);
    assert!(best.header_matched);
    assert_eq!(best.weight, 4000);
    assert!(ranking.answers().iter().all(|a| a.format.as_str() != "xyz"));

    let formats: Vec<String> = tracker.formats().expect("formats").iter().map(|f| f.to_string()).collect();
    assert_eq!(formats, vec!["abc", "xyz"]);

    let overhead = t.elapsed();
    println!("test_learn_compile_identify: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_learn_with_explicit_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("no_extension");
    fs::write(&path, b"GIF89a....").expect("write");

    let mut tracker = Tracker::open(&config_for(dir.path()));
    let err = tracker.learn_file(&path, None).expect_err("no extension");
    assert!(matches!(err, TrackerError::NoExtension(_)));

    let gif = FormatTag::new("gif").expect("tag");
    let report = tracker.learn_file(&path, Some(&gif)).expect("learn");
    assert_eq!(report.format, gif);
    assert!(dir.path().join("learns/gif.learn1").is_file());
}

#[test]
fn test_missing_inputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut tracker = Tracker::open(&config_for(dir.path()));

    let missing = dir.path().join("ghost.abc");
    assert!(matches!(tracker.learn_file(&missing, None), Err(TrackerError::NotFound(_))));
    // A missing file is reported as missing even when it has no extension.
    let bare = dir.path().join("ghost");
    assert!(matches!(tracker.learn_file(&bare, None), Err(TrackerError::NotFound(ref p)) if p == &bare));
    assert!(matches!(tracker.identify_file(&missing), Err(TrackerError::NotFound(_))));

    let abc = FormatTag::new("abc").expect("tag");
    assert!(matches!(tracker.compile(&abc), Err(TrackerError::NotLearned(_))));

    // With no print directory at all there is nothing to identify against.
    fs::write(dir.path().join("file"), b"data").expect("write");
    assert!(matches!(
        tracker.identify_file(&dir.path().join("file")),
        Err(TrackerError::NotLearned(_))
    ));

    // An existing but empty print directory is an empty corpus.
    fs::create_dir_all(dir.path().join("prints")).expect("mkdir");
    assert!(matches!(
        tracker.identify_file(&dir.path().join("file")),
        Err(TrackerError::EmptyCorpus)
    ));
}

#[test]
fn test_cli_pipeline() {
    let t = Instant::now();

    let dir = tempfile::tempdir().expect("tempdir");
    let (first, second) = abc_samples();
    let one = dir.path().join("sample1.abc");
    let two = dir.path().join("sample2.abc");
    fs::write(&one, &first).expect("write");
    fs::write(&two, &second).expect("write");
    let mut third = first;
    third[10] = b'Z';
    let unknown = dir.path().join("mystery");
    fs::write(&unknown, &third).expect("write");

    let printrack = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_printrack"))
            .arg("--store")
            .arg(dir.path())
            .args(args)
            .output()
            .expect("run printrack")
    };

    let learn = printrack(&["learn", one.to_str().expect("utf8"), two.to_str().expect("utf8")]);
    assert!(learn.status.success(), "{}", String::from_utf8_lossy(&learn.stderr));
    let compile = printrack(&["compile", "abc"]);
    assert!(compile.status.success(), "{}", String::from_utf8_lossy(&compile.stderr));

    let identify = printrack(&["identify", unknown.to_str().expect("utf8")]);
    assert!(identify.status.success(), "{}", String::from_utf8_lossy(&identify.stderr));
    let stdout = String::from_utf8_lossy(&identify.stdout);
    assert!(stdout.contains("abc"), "{}", stdout);
    assert!(stdout.contains("100%"), "{}", stdout);
    assert!(stdout.contains("header"), "{}", stdout);

    let list = printrack(&["list"]);
    assert_eq!(String::from_utf8_lossy(&list.stdout).trim(), "abc");

    let missing = printrack(&["compile", "nope"]);
    assert!(!missing.status.success());

    let overhead = t.elapsed();
    println!("test_cli_pipeline: Testing Overhead = {:?}", overhead);
}
