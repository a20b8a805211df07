mod common;

use common::{fake_toolchain, oversized_toolchain, text_file, three_part_tree};
use parchiver::engine::hashing::hash_bytes;
use parchiver::integrity::{ArtifactStatus, SymlinkIssue};
use parchiver::pipeline::{compress_bundles, create_bundles, create_filelists, prepare_archive};
use parchiver::sidecar::{read_path_listing, write_hash_listing};
use parchiver::{ArchiveError, ArchiveOpts, CheckOpts, IntegrityReport, archive, check_integrity};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

fn split_opts() -> ArchiveOpts {
    ArchiveOpts {
        threads: 2,
        part_size: Some(50),
        ..ArchiveOpts::default()
    }
}

fn deep() -> CheckOpts {
    CheckOpts {
        threads: 2,
        deep: true,
        ..CheckOpts::default()
    }
}

/// Archive the three-part tree into `<tmp>/out`.
fn archived(tmp: &Path) -> (PathBuf, PathBuf) {
    let source = three_part_tree(tmp);
    let dest = tmp.join("out");
    assert!(
        archive(&source, &dest, split_opts(), fake_toolchain())
            .unwrap()
            .is_success()
    );
    (source, dest)
}

fn check(dest: &Path, opts: &CheckOpts) -> IntegrityReport {
    check_integrity(dest, opts, &fake_toolchain()).unwrap()
}

#[test]
fn test_clean_archive_passes_both_checks() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());

    let report = check(&dest, &deep());
    assert!(report.passed());
    assert_eq!(report.shallow.found_parts, 3);
    assert_eq!(report.shallow.expected_parts, Some(3));
    assert!(
        report
            .shallow
            .parts
            .iter()
            .all(|p| p.status == ArtifactStatus::Intact)
    );
    let deep = report.deep.unwrap();
    assert_eq!(deep.parts.len(), 3);
    assert!(deep.symlink_warnings.is_empty());

    let shallow_only = check(&dest, &CheckOpts::default());
    assert!(shallow_only.passed());
    assert!(shallow_only.deep.is_none());
}

#[test]
fn test_changed_sidecar_fails_only_that_part() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    fs::write(
        dest.join("data.part2.tar.lz.md5"),
        format!("{}  data.part2.tar.lz\n", "0".repeat(32)),
    )
    .unwrap();

    let report = check(&dest, &CheckOpts::default());
    assert!(!report.passed());
    assert!(!report.shallow.files_missing());
    let changed: Vec<&str> = report.shallow.changed().map(|p| p.name.as_str()).collect();
    assert_eq!(changed, ["data.part2"]);
    let part2 = &report.shallow.parts[1];
    assert_eq!(part2.expected.as_deref(), Some("0".repeat(32).as_str()));
    assert_ne!(part2.actual, part2.expected);

    // Read-only on the archive: a second run says the same.
    let again = check(&dest, &CheckOpts::default());
    assert_eq!(
        serde_json::to_string(&report).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
}

#[test]
fn test_unreadable_sidecar_counts_as_changed() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    fs::write(dest.join("data.part1.tar.lz.md5"), "garbage\n").unwrap();

    let report = check(&dest, &CheckOpts::default());
    let part1 = &report.shallow.parts[0];
    assert_eq!(part1.status, ArtifactStatus::Changed);
    assert!(part1.error.is_some());
    assert!(!report.passed());
}

#[test]
fn test_deleted_part_is_reported_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    fs::remove_file(dest.join("data.part3.tar.lz")).unwrap();

    let report = check(&dest, &CheckOpts::default());
    assert_eq!(report.shallow.found_parts, 2);
    assert!(report.shallow.files_missing());
    assert!(!report.passed());
}

#[test]
fn test_deep_check_finds_content_changed_before_bundling() {
    let tmp = tempfile::tempdir().unwrap();
    let source = three_part_tree(tmp.path());
    let dest = tmp.path().join("out");

    let ctx = prepare_archive(&source, &dest, split_opts(), fake_toolchain()).unwrap();
    assert!(create_filelists(&ctx).unwrap().is_success());
    let flipped = format!("x{}", "b".repeat(29));
    text_file(&source.join("d2/f.txt"), &flipped);
    assert!(create_bundles(&ctx, None).unwrap().is_success());
    assert!(compress_bundles(&ctx, None).unwrap().is_success());

    let report = check(&dest, &deep());
    // Artifact sidecars were written from the bundled content, so only the deep check sees it.
    assert!(report.shallow.passed());
    assert!(!report.passed());

    let deep = report.deep.unwrap();
    assert!(deep.parts[0].passed());
    assert!(deep.parts[2].passed());
    let corrupted = &deep.parts[1].corrupted;
    assert_eq!(corrupted.len(), 1);
    assert_eq!(corrupted[0].path, "data/d2/f.txt");
    assert_eq!(corrupted[0].expected, hash_bytes("b".repeat(30).as_bytes()));
    assert_eq!(corrupted[0].actual, hash_bytes(flipped.as_bytes()));
}

#[test]
fn test_deep_check_reports_missing_and_unexpected_files() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    let listing = vec![(
        "data/d1/ghost.txt".to_string(),
        hash_bytes(b"boo"),
    )];
    write_hash_listing(File::create(dest.join("data.part1.md5")).unwrap(), &listing).unwrap();

    let report = check(&dest, &deep());
    assert!(report.shallow.passed());
    let deep = report.deep.as_ref().unwrap();
    assert_eq!(deep.parts[0].missing, ["data/d1/ghost.txt"]);
    assert_eq!(deep.parts[0].unexpected, ["data/d1/f.txt"]);
    assert!(deep.parts[0].corrupted.is_empty());
    assert!(!report.passed());
}

#[test]
fn test_deep_check_runs_even_when_shallow_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    fs::write(
        dest.join("data.part3.tar.lz.md5"),
        format!("{}  data.part3.tar.lz\n", "f".repeat(32)),
    )
    .unwrap();

    let report = check(&dest, &deep());
    assert!(!report.shallow.passed());
    let deep = report.deep.unwrap();
    assert_eq!(deep.parts.len(), 3);
    assert!(deep.passed());
}

#[test]
fn test_encrypted_archive_is_checked_through_decryption() {
    let tmp = tempfile::tempdir().unwrap();
    let source = three_part_tree(tmp.path());
    let dest = tmp.path().join("out");
    let key = tmp.path().join("k.pub");
    text_file(&key, "key");
    let opts = ArchiveOpts {
        encryption_keys: vec![key],
        remove_unencrypted: true,
        ..split_opts()
    };
    archive(&source, &dest, opts, fake_toolchain()).unwrap();

    let report = check(&dest, &deep());
    assert!(report.passed());
    let artifact = report.shallow.parts[0].artifact.as_ref().unwrap();
    assert!(artifact.to_string_lossy().ends_with("data.part1.tar.lz.gpg"));
}

#[cfg(unix)]
#[test]
fn test_symlinks_resolve_across_parts() {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("data");
    text_file(&source.join("b_dir/target.bin"), &"t".repeat(30));
    fs::create_dir_all(source.join("a_dir")).unwrap();
    symlink("../b_dir/target.bin", source.join("a_dir/link")).unwrap();
    symlink("nowhere", source.join("a_dir/x_dangling")).unwrap();

    let dest = tmp.path().join("out");
    let summary = archive(&source, &dest, split_opts(), fake_toolchain()).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.outcomes.len(), 2);

    let report = check(&dest, &deep());
    let deep = report.deep.as_ref().unwrap();
    assert_eq!(deep.symlink_warnings.len(), 1);
    assert_eq!(deep.symlink_warnings[0].link, "data/a_dir/x_dangling");
    assert_eq!(deep.symlink_warnings[0].issue, SymlinkIssue::Unresolved);
    // Warnings alone never fail the check.
    assert!(report.passed());
}

#[cfg(unix)]
#[test]
fn test_link_to_a_split_directory_resolves() {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("data");
    text_file(&source.join("big/a.bin"), &"a".repeat(6000));
    text_file(&source.join("big/b.bin"), &"b".repeat(6000));
    symlink("big", source.join("z_link")).unwrap();

    let dest = tmp.path().join("out");
    let opts = ArchiveOpts {
        part_size: Some(10_000),
        ..split_opts()
    };
    assert!(archive(&source, &dest, opts, fake_toolchain()).unwrap().is_success());
    assert_eq!(
        read_path_listing(&dest.join("data.part1.lst")).unwrap(),
        ["data/big", "data/big/a.bin"]
    );

    let report = check(&dest, &deep());
    let deep = report.deep.as_ref().unwrap();
    assert!(deep.symlink_warnings.is_empty(), "{:?}", deep.symlink_warnings);
    assert!(report.passed());
}

#[test]
fn test_malformed_bundle_listing_still_yields_a_report() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    fs::write(dest.join("data.part2.tar.lst"), "garbage\n").unwrap();

    let report = check(&dest, &deep());
    let deep = report.deep.as_ref().unwrap();
    assert_eq!(deep.parts.len(), 3);
    assert!(deep.passed());
    assert_eq!(deep.unreadable_listings.len(), 1);
    assert_eq!(deep.unreadable_listings[0].part, "data.part2");
    assert!(deep.unreadable_listings[0].listing.ends_with("data.part2.tar.lst"));
    assert!(report.passed());
}

#[test]
fn test_deep_check_needs_scratch_space_up_front() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest) = archived(tmp.path());
    let scratch = tmp.path().join("scratch");
    fs::create_dir(&scratch).unwrap();
    let opts = CheckOpts {
        work_dir: Some(scratch.clone()),
        ..deep()
    };

    match check_integrity(&dest, &opts, &oversized_toolchain()) {
        Err(ArchiveError::DiskSpace { operation, path, .. }) => {
            assert_eq!(operation, "deep check");
            assert_eq!(path, scratch);
        }
        other => panic!("expected a disk space error, got {other:?}"),
    }
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);

    // Without extraction there is nothing to size.
    assert!(check_integrity(&dest, &CheckOpts::default(), &oversized_toolchain())
        .unwrap()
        .passed());
}
