//! Property tests for the invariants in spec.md §8. Each builds its own
//! throwaway disk image sized generously enough that block exhaustion
//! never interferes with the property under test.
use blockfs::Filesystem;
use proptest::prelude::*;

const GEOMETRY: usize = 2_000;

fn booted() -> (Filesystem, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");
    let fs = Filesystem::boot_with_geometry(&path, GEOMETRY).expect("boot");
    (fs, dir)
}

proptest! {
    /// Invariant 5: any buffer written to a fresh file at offset 0 reads
    /// back identical after a reopen.
    #[test]
    fn read_write_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..15_000)) {
        let (mut fs, _guard) = booted();
        fs.file_create("/f").unwrap();

        let fd = fs.file_open("/f").unwrap();
        fs.file_write(fd, &payload).unwrap();
        fs.file_close(fd).unwrap();

        let fd = fs.file_open("/f").unwrap();
        let mut buf = vec![0u8; payload.len()];
        let read = fs.file_read(fd, &mut buf).unwrap();
        prop_assert_eq!(read, payload.len());
        prop_assert_eq!(buf, payload);
    }

    /// Invariant 6: seeking to the same offset twice and reading the
    /// same length yields the same bytes both times, with no write in
    /// between.
    #[test]
    fn seek_idempotence(
        payload in proptest::collection::vec(any::<u8>(), 16..4_000),
        seek_pos in 0usize..4_000,
        read_len in 1usize..200,
    ) {
        let (mut fs, _guard) = booted();
        fs.file_create("/f").unwrap();
        let fd = fs.file_open("/f").unwrap();
        fs.file_write(fd, &payload).unwrap();

        let seek_pos = (seek_pos % (payload.len() + 1)) as i64;

        fs.file_seek(fd, seek_pos).unwrap();
        let mut first = vec![0u8; read_len];
        let n1 = fs.file_read(fd, &mut first).unwrap();

        fs.file_seek(fd, seek_pos).unwrap();
        let mut second = vec![0u8; read_len];
        let n2 = fs.file_read(fd, &mut second).unwrap();

        prop_assert_eq!(n1, n2);
        prop_assert_eq!(first, second);
    }

    /// Invariant 3: a file's size never exceeds the 30-block cap, and
    /// whole-filesystem invariants (bitmap faithfulness, name
    /// uniqueness) hold after the write.
    #[test]
    fn size_bound_and_invariants_hold(payload in proptest::collection::vec(any::<u8>(), 0..15_360)) {
        let (mut fs, _guard) = booted();
        fs.file_create("/f").unwrap();
        let fd = fs.file_open("/f").unwrap();
        fs.file_write(fd, &payload).unwrap();
        fs.file_close(fd).unwrap();

        prop_assert!(fs.debug_check_invariants().is_ok());
    }

    /// Invariant 4: fd bookkeeping stays consistent across opens and
    /// closes in any order.
    #[test]
    fn fd_parity_holds_across_opens_and_closes(ops in proptest::collection::vec(any::<bool>(), 0..50)) {
        let (mut fs, _guard) = booted();
        fs.file_create("/f").unwrap();

        let mut open_fds = Vec::new();
        for open in ops {
            if open {
                if let Ok(fd) = fs.file_open("/f") {
                    open_fds.push(fd);
                }
            } else if let Some(fd) = open_fds.pop() {
                fs.file_close(fd).unwrap();
            }
            prop_assert!(fs.debug_check_fd_parity());
        }
    }
}

/// Reads every (name, inode_number) pair out of a directory's raw
/// 20-byte records, the same layout `FileRecord` serializes to on disk.
fn read_dir_entries(fs: &Filesystem, path: &str) -> Vec<(String, u32)> {
    let size = fs.dir_size(path).unwrap();
    let mut buf = vec![0u8; size];
    fs.dir_read(path, &mut buf).unwrap();
    buf.chunks_exact(20)
        .map(|record| {
            let name_end = record[..16].iter().position(|&b| b == 0).unwrap_or(16);
            let name = String::from_utf8_lossy(&record[..name_end]).into_owned();
            let inode_no = u32::from_le_bytes(record[16..20].try_into().unwrap());
            (name, inode_no)
        })
        .collect()
}

/// Invariant 7: after File_Unlink, the freed inode/data block is the
/// first one a subsequent File_Create reuses (lowest-free allocation).
#[test]
fn unlink_then_create_reuses_lowest_free() {
    let (mut fs, _guard) = booted();
    fs.file_create("/a").unwrap();
    let first = read_dir_entries(&fs, "/")
        .into_iter()
        .find(|(name, _)| name == "a")
        .unwrap()
        .1;

    let fd = fs.file_open("/a").unwrap();
    fs.file_write(fd, b"some content to force a data block allocation").unwrap();
    fs.file_close(fd).unwrap();
    fs.file_unlink("/a").unwrap();

    fs.file_create("/b").unwrap();
    let second = read_dir_entries(&fs, "/")
        .into_iter()
        .find(|(name, _)| name == "b")
        .unwrap()
        .1;

    assert_eq!(first, second, "freed inode should be reused before any higher one");
}
