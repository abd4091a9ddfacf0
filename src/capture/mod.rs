/// Capture Module
///
/// Runs one photo session on the camera collaborator:
/// 1. Show a "get ready" cue and a countdown before every shot
/// 2. Capture the shots at the resolution the mode calls for
/// 3. Tile multi-shot sessions into one montage
/// 4. Append the label beneath the result when one is configured
pub mod sequencer;
pub mod storage;

pub use sequencer::CaptureSequencer;

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Single,
    /// Several quadrant-sized shots tiled into one image
    Multi(u32),
}

impl CaptureMode {
    pub fn shot_count(&self) -> u32 {
        match self {
            CaptureMode::Single => 1,
            CaptureMode::Multi(count) => *count,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, CaptureMode::Multi(_))
    }
}

/// One photo session, from the first cue to the finished composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    /// Path prefix shared by every file of the session
    pub base_name: PathBuf,
    pub mode: CaptureMode,
    pub shot_paths: Vec<PathBuf>,
    pub composite_path: Option<PathBuf>,
}

impl CaptureSession {
    pub fn new(base_name: PathBuf, mode: CaptureMode) -> Self {
        Self {
            base_name,
            mode,
            shot_paths: Vec::with_capacity(mode.shot_count() as usize),
            composite_path: None,
        }
    }

    /// All shots for the mode have been taken.
    pub fn shots_complete(&self) -> bool {
        self.shot_paths.len() as u32 >= self.mode.shot_count()
    }

    pub fn is_finished(&self) -> bool {
        self.composite_path.is_some()
    }

    /// `<base><suffix>`, e.g. `_single.jpg`.
    pub fn file(&self, suffix: &str) -> PathBuf {
        let mut name = self.base_name.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// File name for shot `number` (1-based).
    pub fn shot_file(&self, number: u32) -> PathBuf {
        match self.mode {
            CaptureMode::Single => self.file("_single.jpg"),
            CaptureMode::Multi(count) => self.file(&format!("_multi_{}of{}.jpg", number, count)),
        }
    }

    /// Every file the session produced, composite last, without duplicates.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.shot_paths.iter().map(PathBuf::as_path).collect();
        if let Some(composite) = &self.composite_path {
            if !files.contains(&composite.as_path()) {
                files.push(composite);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_counts() {
        assert_eq!(CaptureMode::Single.shot_count(), 1);
        assert_eq!(CaptureMode::Multi(4).shot_count(), 4);
        assert!(!CaptureMode::Single.is_multi());
    }

    #[test]
    fn test_file_names() {
        let session = CaptureSession::new(
            PathBuf::from("photos/2024-05-01_18-30-00"),
            CaptureMode::Multi(4),
        );
        assert_eq!(
            session.shot_file(2),
            PathBuf::from("photos/2024-05-01_18-30-00_multi_2of4.jpg")
        );
        assert_eq!(
            session.file("_montage.jpg"),
            PathBuf::from("photos/2024-05-01_18-30-00_montage.jpg")
        );

        let single = CaptureSession::new(PathBuf::from("p/b"), CaptureMode::Single);
        assert_eq!(single.shot_file(1), PathBuf::from("p/b_single.jpg"));
    }

    #[test]
    fn test_files_skip_composite_equal_to_shot() {
        let mut session = CaptureSession::new(PathBuf::from("p/b"), CaptureMode::Single);
        session.shot_paths.push(PathBuf::from("p/b_single.jpg"));
        session.composite_path = Some(PathBuf::from("p/b_single.jpg"));
        assert_eq!(session.files().len(), 1);

        session.composite_path = Some(PathBuf::from("p/b_montage.jpg"));
        assert_eq!(session.files().len(), 2);
    }
}
