use parchiver::engine::tools::{
    add_suffix, compare_part_names, normalize_lexically, parse_size, part_name,
    prepare_destination, split_part_name,
};
use parchiver::engine::path_relative_to;
use parchiver::ArchiveError;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

// --- path_relative_to ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/foo/bar/baz/qux");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("baz/qux"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/other/qux");
    assert_eq!(path_relative_to(&path, &base), None);
}

// --- parse_size ---

#[test]
fn test_parse_size_units_are_binary() {
    assert_eq!(parse_size("5G").unwrap(), 5 * (1 << 30));
    assert_eq!(parse_size("500M").unwrap(), 500 * (1 << 20));
    assert_eq!(parse_size("2KB").unwrap(), 2048);
    assert_eq!(parse_size("1T").unwrap(), 1 << 40);
}

#[test]
fn test_parse_size_bytes_and_fractions() {
    assert_eq!(parse_size("50000000B").unwrap(), 50_000_000);
    assert_eq!(parse_size("1234").unwrap(), 1234);
    assert_eq!(parse_size("1.5 MB").unwrap(), 1_572_864);
    assert_eq!(parse_size("10g").unwrap(), 10 * (1 << 30));
}

#[test]
fn test_parse_size_rejects_garbage() {
    for bad in ["", "G", "5X", "-1G", "0", "abc"] {
        assert!(
            matches!(parse_size(bad), Err(ArchiveError::Validation(_))),
            "{bad:?} should be rejected"
        );
    }
}

// --- part naming ---

#[test]
fn test_part_name() {
    assert_eq!(part_name("data", Some(3)), "data.part3");
    assert_eq!(part_name("data", None), "data");
}

#[test]
fn test_split_part_name() {
    assert_eq!(split_part_name("data.part12"), ("data", Some(12)));
    assert_eq!(split_part_name("my.partial.part2"), ("my.partial", Some(2)));
    assert_eq!(split_part_name("data"), ("data", None));
    assert_eq!(split_part_name("data.partx"), ("data.partx", None));
}

#[test]
fn test_natural_part_order() {
    assert_eq!(compare_part_names("d.part2", "d.part10"), Ordering::Less);
    assert_eq!(compare_part_names("d.part10", "d.part9"), Ordering::Greater);
    assert_eq!(compare_part_names("d", "d.part1"), Ordering::Less);

    let mut names = vec!["d.part10", "d.part1", "d.part3", "d.part2"];
    names.sort_by(|a, b| compare_part_names(a, b));
    assert_eq!(names, ["d.part1", "d.part2", "d.part3", "d.part10"]);
}

#[test]
fn test_add_suffix() {
    assert_eq!(
        add_suffix(Path::new("out/d.part1.tar"), ".md5"),
        PathBuf::from("out/d.part1.tar.md5")
    );
}

// --- normalize_lexically ---

#[test]
fn test_normalize_lexically() {
    assert_eq!(
        normalize_lexically(Path::new("a/b/../c/./d")),
        Some(PathBuf::from("a/c/d"))
    );
    assert_eq!(normalize_lexically(Path::new("a/../..")), None);
    assert_eq!(normalize_lexically(Path::new("a/..")), Some(PathBuf::new()));
}

// --- prepare_destination ---

#[test]
fn test_prepare_destination_creates_new_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("out");
    prepare_destination(&dest, false).unwrap();
    assert!(dest.is_dir());
}

#[test]
fn test_prepare_destination_existing_needs_force() {
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("out");
    std::fs::create_dir(&dest).unwrap();
    std::fs::write(dest.join("old"), b"x").unwrap();

    assert!(matches!(
        prepare_destination(&dest, false),
        Err(ArchiveError::Validation(_))
    ));
    prepare_destination(&dest, true).unwrap();
    assert!(dest.is_dir());
    assert!(!dest.join("old").exists());
}

#[test]
fn test_prepare_destination_missing_parent_needs_force() {
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("a/b/out");
    assert!(prepare_destination(&dest, false).is_err());
    prepare_destination(&dest, true).unwrap();
    assert!(dest.is_dir());
}
