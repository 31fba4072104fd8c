use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use blockfs::fs::{Filesystem, DEFAULT_SECTORS};

/// Boot a blockfs image, sync it, and run the embedded self-test.
#[derive(Debug, Parser)]
#[command(name = "blockfs", version, about)]
struct Cli {
    /// Path to the disk image. Formatted in place if it does not exist.
    image: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Sector count used only when formatting a new image.
    #[arg(short = 'n', long = "sectors", default_value_t = DEFAULT_SECTORS)]
    sectors: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("blockfs: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), blockfs::FsError> {
    let mut fs = Filesystem::boot_with_geometry(&cli.image, cli.sectors)?;
    fs.sync()?;
    self_test(&mut fs)?;
    log::info!("self-test passed against {}", cli.image.display());
    Ok(())
}

/// A smoke test exercising the core lifecycle: directory creation, a
/// file written and read back, and a clean unlink. Mirrors the
/// reference implementation's inline `main.c` self-test rather than a
/// separate test binary.
fn self_test(fs: &mut Filesystem) -> Result<(), blockfs::FsError> {
    const PROBE_DIR: &str = "/blockfs_selftest";
    const PROBE_FILE: &str = "/blockfs_selftest/probe";
    const PAYLOAD: &[u8] = b"blockfs self-test payload";

    if fs.dir_size(PROBE_DIR).is_ok() {
        // Leftover from a prior run against this same image; clean it up
        // before probing again so the test is idempotent across reboots.
        if fs.file_unlink(PROBE_FILE).is_err() {
            log::debug!("self_test: no stale probe file to remove");
        }
        fs.dir_unlink(PROBE_DIR)?;
    }

    fs.dir_create(PROBE_DIR)?;
    fs.file_create(PROBE_FILE)?;

    let fd = fs.file_open(PROBE_FILE)?;
    fs.file_write(fd, PAYLOAD)?;
    fs.file_close(fd)?;

    let fd = fs.file_open(PROBE_FILE)?;
    let mut buf = vec![0u8; PAYLOAD.len()];
    let read = fs.file_read(fd, &mut buf)?;
    fs.file_close(fd)?;

    if read != PAYLOAD.len() || buf != PAYLOAD {
        log::warn!("self_test: read back {read} bytes, content mismatch");
        return Err(blockfs::FsError::General);
    }

    fs.file_unlink(PROBE_FILE)?;
    fs.dir_unlink(PROBE_DIR)?;
    log::debug!("self_test: probe file round-tripped and cleaned up");
    Ok(())
}
