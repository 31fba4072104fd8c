//! Integration tests for the concrete scenarios in spec.md §8, each
//! against its own throwaway disk image.
use blockfs::fs::DEFAULT_SECTORS;
use blockfs::{FsError, Filesystem};

fn booted() -> (Filesystem, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");
    let fs = Filesystem::boot_with_geometry(&path, DEFAULT_SECTORS).expect("boot");
    (fs, dir)
}

/// E1: booting a nonexistent image formats one; booting the same path
/// again passes the magic check.
#[test]
fn e1_boot_formats_then_reboots_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");
    assert!(!path.exists());

    Filesystem::boot_with_geometry(&path, DEFAULT_SECTORS).expect("first boot formats image");
    assert!(path.exists());

    Filesystem::boot_with_geometry(&path, DEFAULT_SECTORS).expect("second boot passes magic check");
}

/// E2: write-then-reread a short file, including a seek back to the start.
#[test]
fn e2_write_read_seek_round_trip() {
    let (mut fs, _guard) = booted();
    fs.file_create("/salam_test").unwrap();

    let fd = fs.file_open("/salam_test").unwrap();
    fs.file_write(fd, b"salam bar to\0").unwrap();
    fs.file_close(fd).unwrap();

    let fd = fs.file_open("/salam_test").unwrap();
    let mut head = [0u8; 5];
    assert_eq!(fs.file_read(fd, &mut head).unwrap(), 5);
    assert_eq!(&head, b"salam");

    fs.file_seek(fd, 0).unwrap();
    assert_eq!(fs.file_read(fd, &mut head).unwrap(), 5);
    assert_eq!(&head, b"salam");

    let mut rest = [0u8; 100];
    let n = fs.file_read(fd, &mut rest).unwrap();
    assert_eq!(n, 8);
    assert_eq!(&rest[..8], b" bar to\0");
}

/// E3: unlink ordering — wrong-type unlinks fail, non-empty dirs refuse
/// to unlink, root can never be unlinked, and removing in the right
/// order eventually empties everything out.
#[test]
fn e3_unlink_ordering() {
    let (mut fs, _guard) = booted();
    fs.dir_create("/u").unwrap();
    fs.dir_create("/u/p1").unwrap();
    fs.dir_create("/u/p2").unwrap();
    fs.dir_create("/u/p2/p3").unwrap();
    fs.file_create("/u/p1/1").unwrap();
    fs.file_create("/u/p1/2").unwrap();

    assert!(fs.dir_unlink("/u/p1/1").is_err(), "p1/1 is a file");
    assert!(fs.file_unlink("/u/p1").is_err(), "p1 is a directory");
    assert_eq!(fs.dir_unlink("/u/p1"), Err(FsError::DirNotEmpty));

    assert!(fs.dir_unlink("/u/p2/p3").is_ok());
    assert!(fs.dir_unlink("/u/p2").is_ok());
    assert_eq!(fs.dir_unlink("/"), Err(FsError::RootDir));

    assert!(fs.file_unlink("/u/p1/1").is_ok());
    assert_eq!(fs.dir_unlink("/u/p1"), Err(FsError::DirNotEmpty));
    assert!(fs.file_unlink("/u/p1/2").is_ok());
    assert!(fs.dir_unlink("/u/p1").is_ok());
}

/// E4: repeated opens of the same file hand out sequential fds; a
/// missing path and a directory path both fail to open as a file.
#[test]
fn e4_repeated_open_and_wrong_target_kinds() {
    let (mut fs, _guard) = booted();
    fs.file_create("/f").unwrap();
    fs.dir_create("/d").unwrap();

    assert_eq!(fs.file_open("/f").unwrap(), 0);
    assert_eq!(fs.file_open("/f").unwrap(), 1);
    assert_eq!(fs.file_open("/f").unwrap(), 2);

    assert!(fs.file_open("/missing").is_err());
    assert_eq!(fs.file_open("/d"), Err(FsError::NoSuchFile));
}

/// E5: the fd table holds exactly MAX_FDS open files.
#[test]
fn e5_fd_table_exhaustion() {
    let (mut fs, _guard) = booted();
    fs.file_create("/test_MAX_FDS").unwrap();

    let mut fds = Vec::new();
    for _ in 0..1000 {
        fds.push(fs.file_open("/test_MAX_FDS").unwrap());
    }
    assert_eq!(fs.file_open("/test_MAX_FDS"), Err(FsError::TooManyOpenFiles));
}

/// E6: a file can grow to exactly 30 blocks; one byte past that fails.
#[test]
fn e6_file_size_exhaustion() {
    let (mut fs, _guard) = booted();
    fs.file_create("/test_TOO_BIG").unwrap();

    let fd = fs.file_open("/test_TOO_BIG").unwrap();
    let payload = vec![b'x'; 15355];
    fs.file_write(fd, &payload).unwrap();
    fs.file_close(fd).unwrap();

    let fd = fs.file_open("/test_TOO_BIG").unwrap();
    fs.file_seek(fd, 15355).unwrap();
    assert_eq!(fs.file_write(fd, &[0u8; 11]), Err(FsError::FileTooBig));
}

/// E7: Dir_Read on a trailing-slash path returns every live record.
#[test]
fn e7_dir_read_with_trailing_slash() {
    let (mut fs, _guard) = booted();
    fs.dir_create("/d").unwrap();
    fs.file_create("/d/a").unwrap();
    fs.file_create("/d/b").unwrap();
    fs.file_create("/d/c").unwrap();

    let mut buf = [0u8; 60];
    let count = fs.dir_read("/d/", &mut buf).unwrap();
    assert_eq!(count, 3);
    assert_eq!(fs.dir_size("/d").unwrap(), 60);
}
