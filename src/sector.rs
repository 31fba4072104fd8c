//! Sector I/O helpers (L1): the only functions that directly touch
//! [`Disk::read`]/[`Disk::write`]. Every byte-granular access anywhere in
//! the crate is a read-modify-write through one of these two functions.
use crate::disk::Disk;
use crate::layout::SECTOR_SIZE;

/// Reads `n` bytes at `offset` within `sector`.
///
/// # Panics
/// Panics if `offset + n` exceeds the sector size; every caller in this
/// crate computes its offsets from fixed on-disk geometry, so this is an
/// internal invariant, not a user-facing error condition.
pub fn read_partial(disk: &Disk, sector: usize, offset: usize, n: usize) -> Vec<u8> {
    assert!(offset + n <= SECTOR_SIZE, "read_partial out of bounds");
    disk.read(sector)[offset..offset + n].to_vec()
}

/// Overwrites `bytes` at `offset` within `sector`, read-modify-write.
///
/// # Panics
/// Panics if `offset + bytes.len()` exceeds the sector size.
pub fn write_partial(disk: &mut Disk, sector: usize, offset: usize, bytes: &[u8]) {
    assert!(
        offset + bytes.len() <= SECTOR_SIZE,
        "write_partial out of bounds"
    );
    let mut buf = *disk.read(sector);
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    disk.write(sector, &buf);
}

/// Zeroes an entire sector, used by the allocators to hand callers a
/// clean block.
pub fn zero_sector(disk: &mut Disk, sector: usize) {
    disk.write(sector, &[0u8; SECTOR_SIZE]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_partial_round_trips() {
        let mut disk = Disk::formatted(4);
        write_partial(&mut disk, 2, 10, b"hello");
        assert_eq!(read_partial(&disk, 2, 10, 5), b"hello");
        // untouched bytes around the write stay zero
        assert_eq!(read_partial(&disk, 2, 0, 10), vec![0u8; 10]);
    }

    #[test]
    #[should_panic]
    fn write_partial_out_of_bounds_panics() {
        let mut disk = Disk::formatted(1);
        write_partial(&mut disk, 0, 510, b"abc");
    }
}
