//! File API and lifecycle (L5): the file-descriptor table, the
//! `File_*`/`Dir_*` operations the rest of the crate exists to support,
//! and the boot/sync lifecycle that makes an image self-describing.
use std::path::{Path, PathBuf};

use crate::bitmap;
use crate::disk::{self, Disk};
use crate::error::{FsError, Result};
use crate::inode::{self, Inode, InodeKind};
use crate::layout::{
    DATA_REGION_START_SECTOR, FILE_RECORD_SIZE, MAGIC, MAGIC_OFFSET, MAX_FDS, NUM_INODES,
    ROOT_INODE, SECTOR_SIZE, SUPERBLOCK_SECTOR,
};
use crate::namespace;
use crate::sector;

/// Default geometry for a freshly-formatted image: 10 000 sectors of
/// 512 bytes each, 5 MiB — the geometry the exhaustion scenario in
/// spec.md §8 (E5/E6) assumes.
pub const DEFAULT_SECTORS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Fd {
    /// 0 means the slot is free. Safe as a sentinel: the root directory
    /// (inode 0) can never be the target of `File_Open`.
    inode_no: u32,
    pos: u32,
}

impl Fd {
    const FREE: Fd = Fd { inode_no: 0, pos: 0 };

    fn is_free(&self) -> bool {
        self.inode_no == 0
    }
}

/// The whole of the filesystem's in-memory state: one open disk image
/// plus the fd table and open-count bookkeeping that does not survive a
/// reboot. Everything else lives on disk and is reached through
/// [`crate::namespace`] and [`crate::inode`].
pub struct Filesystem {
    disk: Disk,
    image_path: PathBuf,
    fds: Vec<Fd>,
    open_count: Vec<u32>,
    last_fd: usize,
    open_file_count: usize,
}

impl Filesystem {
    /// Boots the filesystem at `path` using [`DEFAULT_SECTORS`] geometry
    /// if a new image needs to be formatted.
    pub fn boot(path: &Path) -> Result<Self> {
        Self::boot_with_geometry(path, DEFAULT_SECTORS)
    }

    /// Boots the filesystem at `path`. If no image exists yet, formats
    /// one with `num_sectors` sectors and writes it out immediately so
    /// the path is self-describing from this point on.
    pub fn boot_with_geometry(path: &Path, num_sectors: usize) -> Result<Self> {
        let disk = match disk::try_load(path) {
            Ok(Some(disk)) => {
                let magic_bytes = sector::read_partial(&disk, SUPERBLOCK_SECTOR, MAGIC_OFFSET, 4);
                let magic = u32::from_le_bytes(magic_bytes.try_into().expect("4 magic bytes"));
                if magic != MAGIC {
                    log::warn!("boot: bad magic in {}", path.display());
                    return Err(FsError::General);
                }
                log::info!("boot: loaded existing image {}", path.display());
                disk
            }
            Ok(None) => {
                if num_sectors < DATA_REGION_START_SECTOR {
                    log::warn!(
                        "boot: {num_sectors} sectors is too small to hold the reserved \
                         metadata region ({DATA_REGION_START_SECTOR} sectors minimum)"
                    );
                    return Err(FsError::General);
                }
                log::info!(
                    "boot: formatting new image at {} ({num_sectors} sectors)",
                    path.display()
                );
                let disk = Self::format(num_sectors);
                disk.sync(path).map_err(|e| {
                    log::warn!("boot: failed to write new image: {e}");
                    FsError::General
                })?;
                disk
            }
            Err(e) => {
                log::warn!("boot: failed to read {}: {e}", path.display());
                return Err(FsError::General);
            }
        };

        Ok(Filesystem {
            disk,
            image_path: path.to_path_buf(),
            fds: vec![Fd::FREE; MAX_FDS],
            open_count: vec![0; NUM_INODES],
            last_fd: 0,
            open_file_count: 0,
        })
    }

    fn format(num_sectors: usize) -> Disk {
        let mut disk = Disk::formatted(num_sectors);
        sector::write_partial(&mut disk, SUPERBLOCK_SECTOR, MAGIC_OFFSET, &MAGIC.to_le_bytes());
        bitmap::format_inode_bitmap(&mut disk);
        bitmap::format_data_bitmap(&mut disk);
        inode::write_inode(&mut disk, ROOT_INODE, Inode::zeroed(InodeKind::Dir));
        disk
    }

    /// Flushes the in-memory image to its backing file.
    pub fn sync(&self) -> Result<()> {
        self.disk.sync(&self.image_path).map_err(|e| {
            log::warn!("sync: failed to flush {}: {e}", self.image_path.display());
            FsError::General
        })
    }

    pub fn file_create(&mut self, path: &str) -> Result<()> {
        namespace::create(&mut self.disk, path, InodeKind::File)
    }

    pub fn dir_create(&mut self, path: &str) -> Result<()> {
        namespace::create(&mut self.disk, path, InodeKind::Dir)
    }

    pub fn file_open(&mut self, path: &str) -> Result<usize> {
        if self.open_file_count == MAX_FDS {
            return Err(FsError::TooManyOpenFiles);
        }
        let (inode_no, inode) = namespace::resolve(&self.disk, path, false)?;
        if inode.kind != InodeKind::File {
            return Err(FsError::NoSuchFile);
        }

        let fd = self.next_free_fd()?;
        self.fds[fd] = Fd { inode_no, pos: 0 };
        self.open_count[inode_no as usize] += 1;
        self.open_file_count += 1;
        self.last_fd = (fd + 1) % MAX_FDS;

        log::trace!("file_open: {path} -> fd {fd} (inode {inode_no})");
        Ok(fd)
    }

    fn next_free_fd(&self) -> Result<usize> {
        (0..MAX_FDS)
            .map(|i| (self.last_fd + i) % MAX_FDS)
            .find(|&idx| self.fds[idx].is_free())
            .ok_or(FsError::TooManyOpenFiles)
    }

    fn checked_fd(&self, fd: usize) -> Result<(u32, u32)> {
        let slot = self.fds.get(fd).copied().ok_or(FsError::BadFd)?;
        if slot.is_free() {
            return Err(FsError::BadFd);
        }
        Ok((slot.inode_no, slot.pos))
    }

    pub fn file_read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let (inode_no, start_pos) = self.checked_fd(fd)?;
        let inode = inode::read_inode(&self.disk, inode_no);

        let remaining = inode.size.saturating_sub(start_pos) as usize;
        let want = buf.len().min(remaining);

        let mut pos = start_pos as usize;
        let mut done = 0;
        while done < want {
            let block_idx = pos / SECTOR_SIZE;
            let block_off = pos % SECTOR_SIZE;
            let block = inode.data_blocks[block_idx];
            if block == 0 {
                break;
            }
            let chunk = (SECTOR_SIZE - block_off).min(want - done);
            let bytes = sector::read_partial(&self.disk, block as usize, block_off, chunk);
            buf[done..done + chunk].copy_from_slice(&bytes);
            done += chunk;
            pos += chunk;
        }

        self.fds[fd].pos = pos as u32;
        Ok(done)
    }

    /// Writes `buf` at the fd's current position, extending the file
    /// and allocating blocks as needed. Returns `Ok(())` on full
    /// success, never the byte count: preserved from the reference
    /// behavior (see DESIGN.md).
    pub fn file_write(&mut self, fd: usize, buf: &[u8]) -> Result<()> {
        let (inode_no, start_pos) = self.checked_fd(fd)?;
        let mut inode = inode::read_inode(&self.disk, inode_no);

        let mut pos = start_pos as usize;
        let mut written = 0;
        while written < buf.len() {
            let block_idx = pos / SECTOR_SIZE;
            if block_idx >= inode.data_blocks.len() {
                log::warn!("file_write: fd {fd} would exceed max file size");
                self.fds[fd].pos = pos as u32;
                return Err(FsError::FileTooBig);
            }

            let mut block = inode.data_blocks[block_idx];
            if block == 0 {
                block = match bitmap::alloc_block(&mut self.disk) {
                    Some(b) => b as u32,
                    None => {
                        log::warn!("file_write: no space left for fd {fd}");
                        self.fds[fd].pos = pos as u32;
                        return Err(FsError::NoSpace);
                    }
                };
                inode.data_blocks[block_idx] = block;
            }

            let block_off = pos % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - block_off).min(buf.len() - written);
            sector::write_partial(&mut self.disk, block as usize, block_off, &buf[written..written + chunk]);
            written += chunk;
            pos += chunk;

            if pos as u32 > inode.size {
                inode.size = pos as u32;
                inode::write_inode(&mut self.disk, inode_no, inode);
            }
        }

        self.fds[fd].pos = pos as u32;
        Ok(())
    }

    pub fn file_seek(&mut self, fd: usize, offset: i64) -> Result<u32> {
        let (inode_no, _) = self.checked_fd(fd)?;
        let inode = inode::read_inode(&self.disk, inode_no);
        if offset < 0 || offset as u64 > inode.size as u64 {
            return Err(FsError::SeekOutOfBounds);
        }
        self.fds[fd].pos = offset as u32;
        Ok(offset as u32)
    }

    pub fn file_close(&mut self, fd: usize) -> Result<()> {
        let (inode_no, _) = self.checked_fd(fd)?;
        self.open_count[inode_no as usize] -= 1;
        self.open_file_count -= 1;
        self.fds[fd] = Fd::FREE;
        Ok(())
    }

    pub fn file_unlink(&mut self, path: &str) -> Result<()> {
        let (inode_no, _) = namespace::resolve(&self.disk, path, false)?;
        let is_open = self.open_count.get(inode_no as usize).copied().unwrap_or(0) > 0;
        namespace::unlink_file(&mut self.disk, path, is_open)?;
        Ok(())
    }

    pub fn dir_unlink(&mut self, path: &str) -> Result<()> {
        namespace::unlink_dir(&mut self.disk, path)?;
        Ok(())
    }

    pub fn dir_size(&self, path: &str) -> Result<usize> {
        let (_, dir) = namespace::resolve(&self.disk, path, true)?;
        if dir.kind != InodeKind::Dir {
            return Err(FsError::NoSuchFile);
        }
        Ok(namespace::count_entries(&self.disk, &dir) * FILE_RECORD_SIZE)
    }

    pub fn dir_read(&self, path: &str, buf: &mut [u8]) -> Result<usize> {
        let (_, dir) = namespace::resolve(&self.disk, path, true)?;
        if dir.kind != InodeKind::Dir {
            return Err(FsError::NoSuchFile);
        }
        let size = namespace::count_entries(&self.disk, &dir) * FILE_RECORD_SIZE;
        if buf.len() < size {
            return Err(FsError::BufferTooSmall);
        }
        Ok(namespace::read_entries(&self.disk, &dir, buf))
    }

    /// Walks every inode reachable from the root and checks the
    /// invariants spec.md §8 states: every reachable inode's bitmap bit
    /// is set, every block an inode names is marked allocated, file
    /// sizes stay within their allocated blocks and the 30-block cap,
    /// and no directory holds two live entries with the same name.
    /// Used by the property tests; not part of the day-to-day API.
    pub fn debug_check_invariants(&self) -> std::result::Result<(), String> {
        use std::collections::{HashSet, VecDeque};

        let mut queue = VecDeque::from([ROOT_INODE]);
        let mut visited = HashSet::new();

        while let Some(no) = queue.pop_front() {
            if !visited.insert(no) {
                continue;
            }
            if !bitmap::test_inode(&self.disk, no) {
                return Err(format!("inode {no} is reachable but its bitmap bit is clear"));
            }

            let inode = inode::read_inode(&self.disk, no);
            let live_blocks = inode.data_blocks.iter().filter(|&&b| b != 0);
            for block in live_blocks.clone() {
                if !bitmap::test_block(&self.disk, *block as usize) {
                    return Err(format!("inode {no} names block {block} but its bitmap bit is clear"));
                }
            }

            match inode.kind {
                InodeKind::File => {
                    let cap = live_blocks.count() * SECTOR_SIZE;
                    if inode.size as usize > cap {
                        return Err(format!("inode {no} size {} exceeds {cap} allocated bytes", inode.size));
                    }
                    if inode.size as usize > crate::layout::MAX_FILE_SIZE {
                        return Err(format!("inode {no} size {} exceeds MAX_FILE_SIZE", inode.size));
                    }
                }
                InodeKind::Dir => {
                    let mut names = HashSet::new();
                    for (name, child_no) in namespace::list_entries(&self.disk, &inode) {
                        if !names.insert(name.clone()) {
                            return Err(format!("dir {no} has two live entries named {name:?}"));
                        }
                        queue.push_back(child_no);
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks that `open_file_count`/`open_count` agree with the actual
    /// contents of the fd table.
    pub fn debug_check_fd_parity(&self) -> bool {
        let live = self.fds.iter().filter(|f| !f.is_free()).count();
        if live != self.open_file_count {
            return false;
        }
        self.open_count.iter().enumerate().all(|(i, &expected)| {
            let counted = self
                .fds
                .iter()
                .filter(|f| !f.is_free() && f.inode_no == i as u32)
                .count() as u32;
            counted == expected
        })
    }
}
