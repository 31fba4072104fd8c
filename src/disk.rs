//! The block device: a fixed-geometry array of fixed-size sectors kept
//! entirely in memory, mapped to a host file only at [`Disk::load`] and
//! [`Disk::sync`]. Everything above this module only ever sees whole
//! sectors; byte-granular access is layered on top in [`crate::sector`].
//!
//! This is the one external collaborator spec.md explicitly puts out of
//! scope (§1, §6) — it has no allocation policy, no bitmap, no notion of
//! an inode. It is implemented here, simply, so the rest of the crate has
//! something real to run against.
use std::fs;
use std::io;
use std::path::Path;

use crate::layout::SECTOR_SIZE;

pub type Sector = [u8; SECTOR_SIZE];

/// An in-memory image of `num_sectors` fixed-size sectors.
#[derive(Debug)]
pub struct Disk {
    sectors: Vec<Sector>,
}

impl Disk {
    /// Builds a zeroed image of the given geometry.
    pub fn formatted(num_sectors: usize) -> Self {
        Disk {
            sectors: vec![[0u8; SECTOR_SIZE]; num_sectors],
        }
    }

    /// Loads an image from a host file. The file length must be an exact
    /// multiple of the sector size; anything else is a malformed image.
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.len() % SECTOR_SIZE != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "image length is not a multiple of the sector size",
            ));
        }

        let sectors = bytes
            .chunks_exact(SECTOR_SIZE)
            .map(|chunk| chunk.try_into().expect("chunk is exactly SECTOR_SIZE"))
            .collect();

        Ok(Disk { sectors })
    }

    /// Flushes the full image to a host file, creating or truncating it.
    pub fn sync(&self, path: &Path) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(self.sectors.len() * SECTOR_SIZE);
        for sector in &self.sectors {
            bytes.extend_from_slice(sector);
        }
        fs::write(path, bytes)
    }

    pub fn num_sectors(&self) -> usize {
        self.sectors.len()
    }

    pub fn read(&self, sector: usize) -> &Sector {
        &self.sectors[sector]
    }

    pub fn write(&mut self, sector: usize, data: &Sector) {
        self.sectors[sector] = *data;
    }
}

/// Resolves a disk image path for boot: `Ok(Some(disk))` when the file
/// exists and was loaded, `Ok(None)` when it does not exist yet (caller
/// should format a new image), `Err` for any other I/O failure.
pub fn try_load(path: &Path) -> io::Result<Option<Disk>> {
    match Disk::load(path) {
        Ok(disk) => Ok(Some(disk)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
