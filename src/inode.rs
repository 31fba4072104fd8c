//! Inode store (L3): address translation and full read-modify-write of
//! inode records. No caching — every call is a full RMW cycle through
//! [`crate::sector`] on one metadata sector.
use bytemuck::{Pod, Zeroable};

use crate::bitmap;
use crate::disk::Disk;
use crate::layout::{DIRECT_BLOCKS, INODE_RECORD_SIZE};
use crate::sector;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    Dir = 0,
    File = 1,
}

impl InodeKind {
    fn from_raw(raw: u32) -> Self {
        match raw {
            0 => InodeKind::Dir,
            _ => InodeKind::File,
        }
    }
}

/// On-disk inode record, fixed 128 bytes (four per sector at S = 512).
/// `data_blocks[i] == 0` means "unallocated slot" — sector 0 holds the
/// superblock and is never a legitimate data-block address, which is
/// what makes 0 safe as a sentinel here.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawInode {
    size: u32,
    kind: u32,
    data_blocks: [u32; DIRECT_BLOCKS],
}

/// In-memory view of an inode record, decoded from [`RawInode`].
#[derive(Debug, Clone, Copy)]
pub struct Inode {
    pub size: u32,
    pub kind: InodeKind,
    pub data_blocks: [u32; DIRECT_BLOCKS],
}

impl Inode {
    fn from_raw(raw: RawInode) -> Self {
        Inode {
            size: raw.size,
            kind: InodeKind::from_raw(raw.kind),
            data_blocks: raw.data_blocks,
        }
    }

    fn to_raw(self) -> RawInode {
        RawInode {
            size: self.size,
            kind: self.kind as u32,
            data_blocks: self.data_blocks,
        }
    }

    pub fn zeroed(kind: InodeKind) -> Self {
        Inode {
            size: 0,
            kind,
            data_blocks: [0; DIRECT_BLOCKS],
        }
    }
}

/// Reads inode `inum` from disk.
pub fn read_inode(disk: &Disk, inum: u32) -> Inode {
    let (sec, off) = bitmap::inode_location(inum);
    let bytes = sector::read_partial(disk, sec, off, INODE_RECORD_SIZE);
    let raw: RawInode = *bytemuck::from_bytes(&bytes);
    Inode::from_raw(raw)
}

/// Writes `inode` to disk at `inum`'s location.
pub fn write_inode(disk: &mut Disk, inum: u32, inode: Inode) {
    let (sec, off) = bitmap::inode_location(inum);
    let raw = inode.to_raw();
    sector::write_partial(disk, sec, off, bytemuck::bytes_of(&raw));
}
