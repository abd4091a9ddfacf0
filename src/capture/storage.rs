//! Image folders and backup copies.

use crate::errors::BoothError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Create the images folder and every backup folder that does not exist yet.
///
/// A folder listed twice is reported and only created once.
pub fn prepare_folders(images_folder: &Path, backups: &[PathBuf]) -> Result<(), BoothError> {
    let mut seen = HashSet::new();

    for folder in std::iter::once(images_folder).chain(backups.iter().map(PathBuf::as_path)) {
        if !seen.insert(folder) {
            log::error!("Cannot use same folder path ({:?}) twice", folder);
            continue;
        }
        if !folder.exists() {
            log::info!("Creating folder {:?}", folder);
            fs::create_dir_all(folder)?;
        }
    }
    Ok(())
}

/// Copy every file into every backup folder. Returns the number of copies
/// made; failures are logged and skipped.
pub fn copy_to_backups(files: &[&Path], backups: &[PathBuf]) -> usize {
    let mut copied = 0;
    for dest in backups {
        for src in files {
            let Some(name) = src.file_name() else {
                continue;
            };
            let target = dest.join(name);
            match fs::copy(src, &target) {
                Ok(_) => {
                    log::info!("Copy {:?} -> {:?}", src, dest);
                    copied += 1;
                }
                Err(e) => log::warn!("Failed to copy {:?} -> {:?}: {}", src, dest, e),
            }
        }
    }
    copied
}
