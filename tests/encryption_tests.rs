mod common;

use common::{fake_toolchain, read_tree, sparse_file, text_file, three_part_tree};
use parchiver::sidecar::read_artifact_hash;
use parchiver::utils::available_bytes;
use parchiver::{
    ArchiveError, ArchiveOpts, CheckOpts, DecryptOpts, EncryptOpts, ExtractOpts, archive,
    check_integrity, decrypt_archive, encrypt_archive, extract_archive,
};
use std::fs;
use std::path::{Path, PathBuf};

fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

/// Unencrypted three-part archive in `<tmp>/out` and a key file.
fn plain_archive(tmp: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let source = three_part_tree(tmp);
    let dest = tmp.join("out");
    let opts = ArchiveOpts {
        threads: 2,
        part_size: Some(50),
        ..ArchiveOpts::default()
    };
    assert!(archive(&source, &dest, opts, fake_toolchain()).unwrap().is_success());
    let key = tmp.join("k.pub");
    text_file(&key, "key");
    (source, dest, key)
}

fn encrypt_opts(key: &Path) -> EncryptOpts {
    EncryptOpts {
        threads: 2,
        keys: vec![key.to_path_buf()],
        ..EncryptOpts::default()
    }
}

fn deep_passes(dest: &Path) -> bool {
    let opts = CheckOpts {
        deep: true,
        ..CheckOpts::default()
    };
    check_integrity(dest, &opts, &fake_toolchain()).unwrap().passed()
}

#[test]
fn test_encrypt_then_decrypt_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let (source, dest, key) = plain_archive(tmp.path());

    let opts = EncryptOpts {
        remove_unencrypted: true,
        ..encrypt_opts(&key)
    };
    let summary = encrypt_archive(&dest, None, &opts, &fake_toolchain()).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.outcomes.len(), 3);
    for i in 1..=3 {
        assert!(exists(&dest, &format!("data.part{i}.tar.lz.gpg")));
        assert!(exists(&dest, &format!("data.part{i}.tar.lz.gpg.md5")));
        assert!(!exists(&dest, &format!("data.part{i}.tar.lz")));
        // Kept so decryption can be verified.
        assert!(exists(&dest, &format!("data.part{i}.tar.lz.md5")));
    }
    assert!(deep_passes(&dest));

    let opts = DecryptOpts {
        remove_encrypted: true,
        ..DecryptOpts::default()
    };
    let summary = decrypt_archive(&dest, None, &opts, &fake_toolchain()).unwrap();
    assert!(summary.is_success());
    for i in 1..=3 {
        assert!(exists(&dest, &format!("data.part{i}.tar.lz")));
        assert!(!exists(&dest, &format!("data.part{i}.tar.lz.gpg")));
        assert!(!exists(&dest, &format!("data.part{i}.tar.lz.gpg.md5")));
    }
    assert!(deep_passes(&dest));

    let restored = tmp.path().join("restored");
    extract_archive(&dest, &restored, &ExtractOpts::default(), &fake_toolchain()).unwrap();
    assert_eq!(read_tree(&restored.join("data")), read_tree(&source));
}

#[test]
fn test_encrypt_into_another_directory_keeps_the_originals() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest, key) = plain_archive(tmp.path());
    let vault = tmp.path().join("vault");

    let summary = encrypt_archive(&dest, Some(&vault), &encrypt_opts(&key), &fake_toolchain())
        .unwrap();
    assert!(summary.is_success());
    assert!(exists(&vault, "data.part2.tar.lz.gpg"));
    assert!(exists(&vault, "data.part2.tar.lz.gpg.md5"));
    assert!(exists(&dest, "data.part2.tar.lz"));
    assert!(!exists(&dest, "data.part2.tar.lz.gpg"));

    // Decrypting elsewhere has no recorded hash to verify against, so one is written.
    let plain = tmp.path().join("plain");
    let summary = decrypt_archive(&vault, Some(&plain), &DecryptOpts::default(), &fake_toolchain())
        .unwrap();
    assert!(summary.is_success());
    assert_eq!(
        read_artifact_hash(&plain.join("data.part2.tar.lz.md5")).unwrap(),
        read_artifact_hash(&dest.join("data.part2.tar.lz.md5")).unwrap()
    );
    assert!(exists(&vault, "data.part2.tar.lz.gpg"));
}

#[test]
fn test_encrypting_twice_needs_reencrypt() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest, key) = plain_archive(tmp.path());
    assert!(
        encrypt_archive(&dest, None, &encrypt_opts(&key), &fake_toolchain())
            .unwrap()
            .is_success()
    );

    let other_key = tmp.path().join("other.pub");
    text_file(&other_key, "other");
    assert!(matches!(
        encrypt_archive(&dest, None, &encrypt_opts(&other_key), &fake_toolchain()),
        Err(ArchiveError::Validation(_))
    ));

    // Unencrypted parts still lying next to the encrypted ones block the decryption step.
    let reencrypt = EncryptOpts {
        reencrypt: true,
        ..encrypt_opts(&other_key)
    };
    assert!(matches!(
        encrypt_archive(&dest, None, &reencrypt, &fake_toolchain()),
        Err(ArchiveError::Validation(_))
    ));
    for i in 1..=3 {
        fs::remove_file(dest.join(format!("data.part{i}.tar.lz"))).unwrap();
    }

    let summary = encrypt_archive(&dest, None, &reencrypt, &fake_toolchain()).unwrap();
    assert!(summary.is_success());
    for i in 1..=3 {
        assert!(exists(&dest, &format!("data.part{i}.tar.lz.gpg")));
        assert!(!exists(&dest, &format!("data.part{i}.tar.lz")));
    }
    assert!(deep_passes(&dest));
}

#[test]
fn test_decryption_is_verified_before_removal() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest, key) = plain_archive(tmp.path());
    let opts = EncryptOpts {
        remove_unencrypted: true,
        ..encrypt_opts(&key)
    };
    encrypt_archive(&dest, None, &opts, &fake_toolchain()).unwrap();
    fs::write(
        dest.join("data.part2.tar.lz.md5"),
        format!("{}  data.part2.tar.lz\n", "0".repeat(32)),
    )
    .unwrap();

    let opts = DecryptOpts {
        remove_encrypted: true,
        ..DecryptOpts::default()
    };
    let summary = decrypt_archive(&dest, None, &opts, &fake_toolchain()).unwrap();
    assert_eq!(summary.failed(), ["data.part2"]);
    assert!(matches!(
        summary.outcomes[1].result,
        Err(ArchiveError::Validation(_))
    ));
    assert!(exists(&dest, "data.part2.tar.lz.gpg"));
    assert!(!exists(&dest, "data.part2.tar.lz"));
    assert!(!exists(&dest, "data.part1.tar.lz.gpg"));
}

#[test]
fn test_bad_arguments_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, dest, _) = plain_archive(tmp.path());

    let no_keys = EncryptOpts::default();
    assert!(matches!(
        encrypt_archive(&dest, None, &no_keys, &fake_toolchain()),
        Err(ArchiveError::Validation(_))
    ));
    let missing_key = encrypt_opts(Path::new("/does/not/exist.pub"));
    assert!(matches!(
        encrypt_archive(&dest, None, &missing_key, &fake_toolchain()),
        Err(ArchiveError::Validation(_))
    ));
    // Nothing is encrypted yet.
    assert!(matches!(
        decrypt_archive(&dest, None, &DecryptOpts::default(), &fake_toolchain()),
        Err(ArchiveError::Validation(_))
    ));
}

#[test]
fn test_encryption_checks_free_space_for_the_whole_set() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("big");
    let key = tmp.path().join("k.pub");
    text_file(&key, "key");
    fs::create_dir(&dir).unwrap();
    let free = available_bytes(&dir).unwrap();
    sparse_file(&dir.join("data.tar.lz"), free + 1);

    match encrypt_archive(&dir, None, &encrypt_opts(&key), &fake_toolchain()) {
        Err(ArchiveError::DiskSpace { operation, .. }) => assert_eq!(operation, "encryption"),
        other => panic!("expected a disk space error, got {other:?}"),
    }
    assert!(!exists(&dir, "data.tar.lz.gpg"));
}
