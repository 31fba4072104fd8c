//! Fixed on-disk geometry. Every other module imports its addressing
//! constants from here instead of recomputing them, so layers never need
//! to depend on each other just to agree on where things live.

/// Bytes per sector.
pub const SECTOR_SIZE: usize = 512;

/// Superblock magic number, written at sector 0 byte 0 on format.
pub const MAGIC: u32 = 241_543_903;

/// Sector holding the superblock and the inode bitmap.
pub const SUPERBLOCK_SECTOR: usize = 0;
/// Byte offset of the magic number within the superblock sector.
pub const MAGIC_OFFSET: usize = 0;
/// Byte offset of the inode bitmap within the superblock sector.
pub const INODE_BITMAP_OFFSET: usize = 4;
/// Inode bitmap size in bytes (1000 bits, one per inode).
pub const INODE_BITMAP_BYTES: usize = 125;

/// First sector of the data-block bitmap.
pub const DATA_BITMAP_START_SECTOR: usize = 1;
/// Number of sectors spanned by the data-block bitmap.
pub const DATA_BITMAP_SECTORS: usize = 3;

/// Number of inodes in the inode table.
pub const NUM_INODES: usize = 1000;
/// Size of one on-disk inode record, in bytes.
pub const INODE_RECORD_SIZE: usize = 128;
/// Inodes packed into a single sector.
pub const INODES_PER_SECTOR: usize = SECTOR_SIZE / INODE_RECORD_SIZE;
/// First sector of the inode table.
pub const INODE_TABLE_START_SECTOR: usize = 4;
/// Number of sectors spanned by the inode table (1000 inodes / 4 per sector).
pub const INODE_TABLE_SECTORS: usize = NUM_INODES / INODES_PER_SECTOR;

/// First sector of the data region (directory blocks and file data blocks).
pub const DATA_REGION_START_SECTOR: usize =
    INODE_TABLE_START_SECTOR + INODE_TABLE_SECTORS;

/// Number of direct data-block slots per inode.
pub const DIRECT_BLOCKS: usize = 30;
/// Maximum file size in bytes: `DIRECT_BLOCKS * SECTOR_SIZE`.
pub const MAX_FILE_SIZE: usize = DIRECT_BLOCKS * SECTOR_SIZE;

/// Size of one directory entry (file record), in bytes.
pub const FILE_RECORD_SIZE: usize = 20;
/// Maximum length of a path component, excluding the NUL terminator.
pub const MAX_NAME_LEN: usize = 15;
/// File records packed into a single data block.
pub const RECORDS_PER_BLOCK: usize = SECTOR_SIZE / FILE_RECORD_SIZE;

/// Inode number of the root directory. Root is never referenced by any
/// directory entry, which is what makes 0 an unambiguous "free slot"
/// sentinel in both file records and fd slots.
pub const ROOT_INODE: u32 = 0;

/// Number of bits (sectors 0..253) that the data-block bitmap must report
/// as permanently allocated: the reserved metadata region.
pub const RESERVED_DATA_BITS: usize = DATA_REGION_START_SECTOR;

/// Byte offset into data-block bitmap sector 1 where scanning starts.
/// `RESERVED_DATA_BITS` (254) bits are reserved, but the scan begins at
/// byte 32 (bit 256), not byte `254/8` (bit 254): bits 254 and 255 are
/// permanently unreachable. See design notes for why this is kept.
pub const DATA_SCAN_START_BYTE: usize = RESERVED_DATA_BITS / 8 + 1;

/// Maximum number of simultaneously open file descriptors.
pub const MAX_FDS: usize = 1000;
