//! Public error surface.
//!
//! The source this crate is modeled on returns `-1` and sets a global
//! `errno`-style variable; that convention doesn't belong in idiomatic
//! Rust. [`FsError`] carries the same distinctions (one variant per
//! code in spec §6) through `Result<T, FsError>` instead, and
//! [`FsError::code`] recovers the legacy numeric identity for logging
//! or process exit codes.
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("boot or sync failure")]
    General,
    #[error("bad path or directory entry: {0}")]
    Create(&'static str),
    #[error("no such file")]
    NoSuchFile,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("bad file descriptor")]
    BadFd,
    #[error("seek offset out of bounds")]
    SeekOutOfBounds,
    #[error("no space left on device")]
    NoSpace,
    #[error("file too big")]
    FileTooBig,
    #[error("file is in use")]
    FileInUse,
    #[error("directory not empty")]
    DirNotEmpty,
    #[error("cannot unlink root directory")]
    RootDir,
    #[error("buffer too small")]
    BufferTooSmall,
}

impl FsError {
    /// The legacy `errno`-style numeric identity for this error, kept only
    /// for diagnostics: nothing in this crate branches on it.
    pub fn code(self) -> i32 {
        match self {
            FsError::General => 1,
            FsError::Create(_) => 2,
            FsError::NoSuchFile => 3,
            FsError::TooManyOpenFiles => 4,
            FsError::BadFd => 5,
            FsError::SeekOutOfBounds => 6,
            FsError::NoSpace => 7,
            FsError::FileTooBig => 8,
            FsError::FileInUse => 9,
            FsError::DirNotEmpty => 10,
            FsError::RootDir => 11,
            FsError::BufferTooSmall => 12,
        }
    }
}

pub type Result<T> = core::result::Result<T, FsError>;
