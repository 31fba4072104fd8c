//! Directory entries ("file records"): fixed 20-byte (name, inode_number)
//! pairs stored inside a directory's data blocks, `RECORDS_PER_BLOCK`
//! slots to a block.
use bytemuck::{Pod, Zeroable};

use crate::layout::MAX_NAME_LEN;

/// One 20-byte directory entry. `inode_number == 0` means the slot is
/// free — the root inode is never referenced by a directory entry, so
/// this is an unambiguous marker, not a collision with a real root entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq, Eq)]
pub struct FileRecord {
    name: [u8; 16],
    pub inode_number: u32,
}

impl FileRecord {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn free() -> Self {
        FileRecord {
            name: [0; 16],
            inode_number: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.inode_number == 0
    }

    /// Builds a record. `name` must be non-empty and at most
    /// [`MAX_NAME_LEN`] bytes; the caller validates this before creation.
    pub fn new(name: &str, inode_number: u32) -> Self {
        debug_assert!(!name.is_empty() && name.len() <= MAX_NAME_LEN);
        let mut bytes = [0u8; 16];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        FileRecord {
            name: bytes,
            inode_number,
        }
    }

    /// The record's name, up to the first NUL byte.
    pub fn name(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(16);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    pub fn name_matches(&self, other: &str) -> bool {
        self.name() == other
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        *bytemuck::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let rec = FileRecord::new("salam", 7);
        let bytes = rec.as_bytes().to_vec();
        let back = FileRecord::from_bytes(&bytes);
        assert_eq!(back.name(), "salam");
        assert_eq!(back.inode_number, 7);
    }

    #[test]
    fn free_slot_has_zero_inode_number() {
        assert!(FileRecord::free().is_free());
        assert!(!FileRecord::new("x", 1).is_free());
    }
}
