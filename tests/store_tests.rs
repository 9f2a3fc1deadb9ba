//! # Core Layer Tests: DirStore, TrackerConfig, FormatTag
//!
//! Validates the on-disk consensus layout, corruption handling, the print
//! directory listing and configuration defaults.

use printrack::{
    ConsensusBuffer, ConsensusPair, ConsensusStore, DirStore, FormatTag, Learner, LengthPolicy,
    Orientation, PrintCorpus, TrackerConfig, TrackerError,
};
use printrack_dsa::LayoutError;
use std::fs;
use std::path::Path;
use std::time::Instant;

fn tag(name: &str) -> FormatTag {
    FormatTag::new(name).expect("valid tag")
}

fn store_in(root: &Path) -> DirStore {
    DirStore::new(root.join("learns"), root.join("prints"))
}

fn learned_pair() -> ConsensusPair {
    let mut pair = ConsensusPair::seed(b"%PDF-1.7\n%abcdef\n%%EOF\n");
    pair.intersect(b"%PDF-1.4\n%uvwxyz\n%%EOF\n", LengthPolicy::Wildcard);
    pair
}

/// Verifies that a saved pair loads back identically and lands in the
/// documented files.
#[test]
fn test_dir_store_pair_roundtrip() {
    let t = Instant::now();

    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());
    let format = tag("pdf");
    let pair = learned_pair();

    assert_eq!(store.load_pair(&format).expect("load"), None);
    store.save_pair(&format, &pair).expect("save");
    assert_eq!(store.load_pair(&format).expect("load"), Some(pair.clone()));

    let forward = fs::read(dir.path().join("learns/pdf.learn1")).expect("learn1");
    let reverse = fs::read(dir.path().join("learns/pdf.learn2")).expect("learn2");
    assert_eq!(&forward[..4], b"PTCB");
    assert_eq!(forward[5], b'd');
    assert_eq!(reverse[5], b'i');
    assert_eq!(forward.len(), pair.forward.encoded_len());

    // No temporary files are left next to the buffers.
    let entries = fs::read_dir(dir.path().join("learns")).expect("read_dir").count();
    assert_eq!(entries, 2);

    let overhead = t.elapsed();
    println!("test_dir_store_pair_roundtrip: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_layout_roundtrip_keeps_wildcards() {
    let pair = learned_pair();
    let decoded = ConsensusBuffer::from_bytes(&pair.forward.to_vec()).expect("decode");
    assert_eq!(decoded, pair.forward);
    assert_eq!(decoded.wildcard_count(), 7);
    assert_eq!(decoded.get(7), None);
    assert_eq!(decoded.get(0), Some(b'%'));
}

#[test]
fn test_layout_rejects_damage() {
    let raw = learned_pair().forward.to_vec();

    let mut bad_magic = raw.clone();
    bad_magic[0] = b'X';
    assert_eq!(ConsensusBuffer::from_bytes(&bad_magic), Err(LayoutError::BadMagic));

    let mut bad_version = raw.clone();
    bad_version[4] = 9;
    assert_eq!(
        ConsensusBuffer::from_bytes(&bad_version),
        Err(LayoutError::UnsupportedVersion(9))
    );

    let mut bad_tag = raw.clone();
    bad_tag[5] = b'q';
    assert_eq!(ConsensusBuffer::from_bytes(&bad_tag), Err(LayoutError::BadOrientation(b'q')));

    assert!(matches!(
        ConsensusBuffer::from_bytes(&raw[..raw.len() - 1]),
        Err(LayoutError::Truncated { .. })
    ));

    let mut trailing = raw.clone();
    trailing.push(0);
    assert_eq!(ConsensusBuffer::from_bytes(&trailing), Err(LayoutError::TrailingBytes(1)));

    // 23 cells: the last word may only use its low 23 bits.
    let mut stray = raw;
    let last = stray.len() - 1;
    stray[last] = 0x80;
    assert_eq!(ConsensusBuffer::from_bytes(&stray), Err(LayoutError::StrayBits));
}

#[test]
fn test_corrupt_consensus_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());
    let format = tag("pdf");
    store.save_pair(&format, &learned_pair()).expect("save");

    fs::write(dir.path().join("learns/pdf.learn2"), b"garbage").expect("corrupt");
    let err = store.load_pair(&format).expect_err("corrupt");
    assert!(matches!(err, TrackerError::CorruptConsensus { ref format, .. } if format == "pdf"));

    // A forward buffer saved under the reverse name is caught too.
    let forward = learned_pair().forward.to_vec();
    fs::write(dir.path().join("learns/pdf.learn2"), forward).expect("swap");
    let err = store.load_pair(&format).expect_err("wrong orientation");
    assert!(matches!(
        err,
        TrackerError::CorruptConsensus {
            reason: LayoutError::BadOrientation(b'd'),
            ..
        }
    ));
}

/// A lone half is treated as nothing learned.
#[test]
fn test_incomplete_pair_reads_as_unlearned() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());
    let format = tag("pdf");
    store.save_pair(&format, &learned_pair()).expect("save");
    fs::remove_file(dir.path().join("learns/pdf.learn1")).expect("remove");
    assert_eq!(store.load_pair(&format).expect("load"), None);
}

/// A reverse half that cannot be renamed into place fails the save, and the
/// forward half it left behind is never loaded next to the older reverse.
#[test]
fn test_interrupted_pair_save_is_detected() {
    let t = Instant::now();

    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());
    let format = tag("bin");
    let learns = dir.path().join("learns");

    let seeded = ConsensusPair::seed(b"\x7fELF\x02\x01\x01\x00 body");
    store.save_pair(&format, &seeded).expect("save");
    let old_reverse = fs::read(learns.join("bin.learn2")).expect("learn2");

    // Block the reverse target with a non-empty directory.
    fs::remove_file(learns.join("bin.learn2")).expect("remove");
    fs::create_dir(learns.join("bin.learn2")).expect("mkdir");
    fs::write(learns.join("bin.learn2").join("keep"), b"x").expect("write");

    let mut learned = seeded.clone();
    learned.intersect(b"\x7fELF\x02\x01\x01\x00 BODY", LengthPolicy::Wildcard);
    assert!(store.save_pair(&format, &learned).is_err());

    // No staged temporaries survive the failed save.
    assert_eq!(fs::read_dir(&learns).expect("read_dir").count(), 2);

    // Put the previous reverse half back: the halves now come from
    // different learn calls.
    fs::remove_dir_all(learns.join("bin.learn2")).expect("rmdir");
    fs::write(learns.join("bin.learn2"), &old_reverse).expect("restore");
    let forward = ConsensusBuffer::from_bytes(&fs::read(learns.join("bin.learn1")).expect("learn1")).expect("decode");
    assert_eq!(forward.samples(), 2);
    assert_eq!(store.load_pair(&format).expect("load"), None);

    // The next sample reseeds both halves.
    let report = Learner::default()
        .learn_bytes(&mut store, &format, b"\x7fELF\x02\x01\x01\x00 body")
        .expect("learn");
    assert!(report.seeded);
    assert_eq!(store.load_pair(&format).expect("load"), Some(seeded));

    let overhead = t.elapsed();
    println!("test_interrupted_pair_save_is_detected: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_mixed_pair_halves_read_as_unlearned() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());
    let format = tag("pdf");
    let pair = learned_pair();
    store.save_pair(&format, &pair).expect("save");
    assert_eq!(pair.samples(), Some(2));

    let newer = {
        let mut newer = pair.clone();
        newer.intersect(b"%PDF-1.4\n%uvwxyz\n%%EOF\n", LengthPolicy::Wildcard);
        newer
    };
    fs::write(dir.path().join("learns/pdf.learn1"), newer.forward.to_vec()).expect("overwrite");
    assert_eq!(store.load_pair(&format).expect("load"), None);
}

#[test]
fn test_print_listing() {
    let t = Instant::now();

    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store_in(dir.path());

    let err = store.formats().expect_err("no corpus yet");
    assert!(matches!(err, TrackerError::NotLearned(_)));

    store.write_print(&tag("zip"), b"<0|2|d>PK").expect("write");
    store.write_print(&tag("gif"), b"<0|3|d>GIF").expect("write");
    store.write_print(&tag("7z"), b"").expect("write");
    fs::write(dir.path().join("prints/README"), b"not a print").expect("stray");
    fs::write(dir.path().join("prints/old.print.bak"), b"backup").expect("stray");

    let formats: Vec<String> = store
        .formats()
        .expect("formats")
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(formats, vec!["7z", "gif", "zip"]);

    assert_eq!(
        store.read_print(&tag("gif")).expect("read"),
        Some(b"<0|3|d>GIF".to_vec())
    );
    assert_eq!(store.read_print(&tag("png")).expect("read"), None);

    let overhead = t.elapsed();
    println!("test_print_listing: Testing Overhead = {:?}", overhead);
}

/// Verifies that `TrackerConfig::default()` returns sane values.
#[test]
fn test_tracker_config_defaults() {
    let t = Instant::now();

    let config = TrackerConfig::default();
    assert_eq!(config.learns_dir, "learns");
    assert_eq!(config.prints_dir, "prints");
    assert_eq!(config.length_policy, LengthPolicy::Wildcard);
    assert!((1..=8).contains(&config.scan_threads));
    assert_eq!(config.report_limit, 45);
    assert_eq!(config.prints_path(), Path::new("./prints"));

    let overhead = t.elapsed();
    println!("test_tracker_config_defaults: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_tracker_config_from_toml() {
    let config = TrackerConfig::from_toml_str(
        r#"
        store_root = "/var/lib/printrack"
        length_policy = "retain"
        scan_threads = 2
        "#,
    )
    .expect("parse");
    assert_eq!(config.length_policy, LengthPolicy::Retain);
    assert_eq!(config.scan_threads, 2);
    assert_eq!(config.report_limit, 45, "unset keys keep their defaults");
    assert_eq!(config.learns_path(), Path::new("/var/lib/printrack/learns"));

    let err = TrackerConfig::from_toml_str("length_policy = \"sometimes\"").expect_err("bad policy");
    assert!(matches!(err, TrackerError::Config(_)));
}

#[test]
fn test_tracker_config_load_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("printrack.toml");
    let err = TrackerConfig::load(&missing).expect_err("missing");
    assert!(matches!(err, TrackerError::NotFound(ref p) if p == &missing));
}

#[test]
fn test_format_tags() {
    assert_eq!(FormatTag::from_path(Path::new("a/b/photo.jpeg")).expect("tag").as_str(), "jpeg");
    assert_eq!(FormatTag::from_path(Path::new("archive.tar.gz")).expect("tag").as_str(), "gz");

    for path in ["README", "trailing.", ".hidden"] {
        let err = FormatTag::from_path(Path::new(path)).expect_err(path);
        assert!(matches!(err, TrackerError::NoExtension(_)), "{}", path);
    }
    for bad in ["", ".", "..", "a/b", "a\\b"] {
        assert!(FormatTag::new(bad).is_err(), "{:?}", bad);
    }
    assert_eq!(tag("png").to_string(), "png");
    assert_eq!(Orientation::from_tag(b'i'), Some(Orientation::Reverse));
}
