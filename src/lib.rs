//! `blockfs`: a single-user filesystem over a fixed-size block-device
//! image backed by a host file. See [`fs::Filesystem`] for the
//! entry-point lifecycle (`boot`/`sync`) and file/directory operations.
pub mod bitmap;
pub mod disk;
pub mod error;
pub mod fs;
pub mod inode;
pub mod layout;
pub mod namespace;
pub mod record;
pub mod sector;

pub use error::{FsError, Result};
pub use fs::Filesystem;
