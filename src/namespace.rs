//! Namespace (L4): path parsing, directory-entry scanning, and
//! create/find/unlink of names. Everything here operates directly on a
//! [`Disk`] through [`crate::inode`], [`crate::bitmap`] and
//! [`crate::record`] — no fd table, no open-file bookkeeping (that is
//! [`crate::fs`]'s job, one layer up).
use crate::bitmap;
use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::inode::{self, Inode, InodeKind};
use crate::layout::{FILE_RECORD_SIZE, MAX_NAME_LEN, RECORDS_PER_BLOCK, ROOT_INODE};
use crate::record::FileRecord;
use crate::sector;

/// Splits an absolute path into components, rejecting empty components
/// and components longer than [`MAX_NAME_LEN`]. A single trailing slash
/// is stripped when `allow_trailing_slash` is set (directory reads);
/// otherwise a trailing slash is an error (creation).
fn parse_path(path: &str, allow_trailing_slash: bool) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(FsError::Create("path must be absolute"));
    }
    if path == "/" {
        return Ok(Vec::new());
    }

    let mut rest = &path[1..];
    if let Some(stripped) = rest.strip_suffix('/') {
        if !allow_trailing_slash {
            return Err(FsError::Create("path must not end with '/'"));
        }
        rest = stripped;
    }

    let mut components = Vec::new();
    for part in rest.split('/') {
        if part.is_empty() {
            return Err(FsError::Create("empty path component"));
        }
        if part.len() > MAX_NAME_LEN {
            return Err(FsError::Create("path component too long"));
        }
        components.push(part);
    }
    Ok(components)
}

/// Scans a directory's data blocks for a live record named `name`.
/// Returns the block sector, the slot index within that block, and the
/// decoded record.
fn find_entry(disk: &Disk, dir: &Inode, name: &str) -> Option<(usize, usize, FileRecord)> {
    for &block in dir.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let bytes = sector::read_partial(disk, block as usize, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            let record = FileRecord::from_bytes(&bytes);
            if !record.is_free() && record.name_matches(name) {
                return Some((block as usize, slot, record));
            }
        }
    }
    None
}

/// Walks `components` from the root, treating every one of them as an
/// intermediate directory lookup. Used both to resolve a full path
/// ([`resolve`]) and to walk all but the last component ([`resolve_parent`]).
fn walk(disk: &Disk, components: &[&str]) -> Result<(u32, Inode)> {
    let mut cur_no = ROOT_INODE;
    let mut cur = inode::read_inode(disk, cur_no);

    for component in components {
        if cur.kind != InodeKind::Dir {
            return Err(FsError::NoSuchFile);
        }
        match find_entry(disk, &cur, component) {
            Some((_, _, record)) => {
                cur_no = record.inode_number;
                cur = inode::read_inode(disk, cur_no);
            }
            None => return Err(FsError::NoSuchFile),
        }
    }

    Ok((cur_no, cur))
}

/// Resolves the full path to an inode.
pub fn resolve(disk: &Disk, path: &str, allow_trailing_slash: bool) -> Result<(u32, Inode)> {
    let components = parse_path(path, allow_trailing_slash)?;
    walk(disk, &components)
}

/// Resolves to the parent directory and the final path component's name.
/// Never accepts a trailing slash: every caller of `resolve_parent` is
/// about to create or remove the named entry.
pub fn resolve_parent(disk: &Disk, path: &str) -> Result<(u32, Inode, String)> {
    let components = parse_path(path, false)?;
    let (last, intermediate) = components
        .split_last()
        .ok_or(FsError::Create("path has no final component"))?;
    let (parent_no, parent) = walk(disk, intermediate)?;
    Ok((parent_no, parent, (*last).to_string()))
}

/// Creates a new file or directory at `path`.
pub fn create(disk: &mut Disk, path: &str, kind: InodeKind) -> Result<()> {
    let (parent_no, mut parent, name) =
        resolve_parent(disk, path).map_err(|_| FsError::Create("parent path not found"))?;

    if parent.kind != InodeKind::Dir {
        return Err(FsError::Create("parent is not a directory"));
    }
    if find_entry(disk, &parent, &name).is_some() {
        return Err(FsError::Create("already exists"));
    }

    // Reuse a free slot in an already-allocated block if one exists.
    let mut target = None;
    'outer: for &block in parent.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let bytes = sector::read_partial(disk, block as usize, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            if FileRecord::from_bytes(&bytes).is_free() {
                target = Some((block as usize, slot));
                break 'outer;
            }
        }
    }

    if target.is_none() {
        let free_index = parent
            .data_blocks
            .iter()
            .position(|&b| b == 0)
            .ok_or(FsError::Create("directory is full"))?;
        let block = bitmap::alloc_block(disk).ok_or(FsError::Create("no space for directory block"))?;
        parent.data_blocks[free_index] = block as u32;
        target = Some((block, 0));
    }
    let (block, slot) = target.expect("target slot resolved above");

    let new_no = bitmap::alloc_inode(disk).ok_or(FsError::Create("no free inode"))?;
    inode::write_inode(disk, new_no, Inode::zeroed(kind));

    let record = FileRecord::new(&name, new_no);
    sector::write_partial(disk, block, slot * FILE_RECORD_SIZE, record.as_bytes());
    // Rewritten even when no new block was added: harmless, but tests
    // that measure directory growth depend on the parent inode being
    // persisted on every create.
    inode::write_inode(disk, parent_no, parent);

    log::debug!("create: {path} -> inode {new_no}");
    Ok(())
}

/// Zeroes the parent directory's record for `inode_no` and, if that
/// leaves the containing block entirely free, returns the block to the
/// bitmap. The parent inode's `data_blocks` entry is deliberately left
/// pointing at the now-free block — the same dangling-reference
/// behavior the reference implementation exhibits (see DESIGN.md).
fn remove_from_parent(disk: &mut Disk, path: &str, inode_no: u32) -> Result<()> {
    let (_, parent, _name) = resolve_parent(disk, path)?;

    for &block in parent.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        let block = block as usize;
        let mut touched = false;
        for slot in 0..RECORDS_PER_BLOCK {
            let offset = slot * FILE_RECORD_SIZE;
            let bytes = sector::read_partial(disk, block, offset, FILE_RECORD_SIZE);
            let record = FileRecord::from_bytes(&bytes);
            if !record.is_free() && record.inode_number == inode_no {
                sector::write_partial(disk, block, offset, FileRecord::free().as_bytes());
                touched = true;
            }
        }
        if !touched {
            continue;
        }

        let all_free = (0..RECORDS_PER_BLOCK).all(|slot| {
            let bytes = sector::read_partial(disk, block, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            FileRecord::from_bytes(&bytes).is_free()
        });
        if all_free {
            bitmap::free_block(disk, block);
        }
        return Ok(());
    }

    Ok(())
}

/// Unlinks a regular file. `is_open` must reflect whether any fd
/// currently references the target inode — the fd table itself lives
/// one layer up, in [`crate::fs`].
pub fn unlink_file(disk: &mut Disk, path: &str, is_open: bool) -> Result<u32> {
    let (no, target) = resolve(disk, path, false)?;
    if target.kind != InodeKind::File {
        return Err(FsError::NoSuchFile);
    }
    if is_open {
        return Err(FsError::FileInUse);
    }

    for &block in target.data_blocks.iter() {
        if block != 0 {
            bitmap::free_block(disk, block as usize);
        }
    }
    bitmap::free_inode(disk, no);
    remove_from_parent(disk, path, no)?;

    log::debug!("unlink_file: removed inode {no} at {path}");
    Ok(no)
}

/// Unlinks an empty directory.
pub fn unlink_dir(disk: &mut Disk, path: &str) -> Result<u32> {
    if path == "/" {
        return Err(FsError::RootDir);
    }

    let (no, target) = resolve(disk, path, false)?;
    if target.kind != InodeKind::Dir {
        return Err(FsError::NoSuchFile);
    }

    for &block in target.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let bytes = sector::read_partial(disk, block as usize, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            if !FileRecord::from_bytes(&bytes).is_free() {
                return Err(FsError::DirNotEmpty);
            }
        }
    }

    // The directory's own (now-empty) data blocks are not freed here,
    // only detached from the namespace: matches the reference's
    // parent-side-only reclamation rule. See DESIGN.md.
    bitmap::free_inode(disk, no);
    remove_from_parent(disk, path, no)?;

    log::debug!("unlink_dir: removed inode {no} at {path}");
    Ok(no)
}

/// Counts live entries in a directory (used by `Dir_Size`/`Dir_Read`).
pub fn count_entries(disk: &Disk, dir: &Inode) -> usize {
    let mut count = 0;
    for &block in dir.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let bytes = sector::read_partial(disk, block as usize, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            if !FileRecord::from_bytes(&bytes).is_free() {
                count += 1;
            }
        }
    }
    count
}

/// Copies every live 20-byte record of `dir` into `buf`, in scan order.
/// Returns the number of records copied. `buf` must be at least
/// `count_entries(dir) * FILE_RECORD_SIZE` bytes.
pub fn read_entries(disk: &Disk, dir: &Inode, buf: &mut [u8]) -> usize {
    let mut copied = 0;
    for &block in dir.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let offset = slot * FILE_RECORD_SIZE;
            let bytes = sector::read_partial(disk, block as usize, offset, FILE_RECORD_SIZE);
            let record = FileRecord::from_bytes(&bytes);
            if record.is_free() {
                continue;
            }
            let dst = copied * FILE_RECORD_SIZE;
            buf[dst..dst + FILE_RECORD_SIZE].copy_from_slice(record.as_bytes());
            copied += 1;
        }
    }
    copied
}

/// Lists every live `(name, inode_number)` pair in `dir`, in scan order.
/// Used by invariant checks that need to walk the whole namespace tree.
pub fn list_entries(disk: &Disk, dir: &Inode) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    for &block in dir.data_blocks.iter() {
        if block == 0 {
            continue;
        }
        for slot in 0..RECORDS_PER_BLOCK {
            let bytes = sector::read_partial(disk, block as usize, slot * FILE_RECORD_SIZE, FILE_RECORD_SIZE);
            let record = FileRecord::from_bytes(&bytes);
            if !record.is_free() {
                out.push((record.name().to_string(), record.inode_number));
            }
        }
    }
    out
}
