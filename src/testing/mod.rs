//! Testing utilities for the booth core
//!
//! Recording doubles for every collaborator trait. Each double writes the
//! calls it receives into a shared [`Journal`], so a test can assert on the
//! exact order in which the core drove the hardware.

pub mod mocks;

pub use mocks::{MockCamera, MockIo, MockLights, MockSpooler};

use crate::types::{
    ButtonId, JobHandle, OutputId, OverlayHandle, PreviewSetup, Resolution, Rgb, TileLayout,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    // io
    SetLevel(OutputId, bool),
    EnableEdges(Vec<ButtonId>),
    DisableEdges(Vec<ButtonId>),
    Release,

    // camera
    StartPreview(PreviewSetup),
    Capture {
        resolution: Resolution,
        path: PathBuf,
    },
    ShowOverlay {
        image: PathBuf,
        layer: u8,
        persistent: bool,
    },
    RemoveOverlay(OverlayHandle),
    Preview(bool),
    Countdown(u32),
    Composite {
        shots: Vec<PathBuf>,
        layout: TileLayout,
        output: PathBuf,
    },
    ConcatLabel {
        image: PathBuf,
        label: PathBuf,
        output: PathBuf,
    },
    ShowText(String),
    CameraStop,

    // lights
    Fill(Rgb),
    LightsClear,

    // spooler
    Submit(PathBuf),
    Cancel(JobHandle),
    EnablePrinter,
    CancelAll,
}

/// Ordered, shared call log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().iter().filter(|c| pred(c)).count()
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.lock().iter().position(pred)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_is_shared_between_clones() {
        let journal = Journal::new();
        let other = journal.clone();
        other.record(Call::CameraStop);
        journal.record(Call::Release);

        assert_eq!(journal.calls(), vec![Call::CameraStop, Call::Release]);
        assert_eq!(other.position(|c| *c == Call::Release), Some(1));
        journal.clear();
        assert!(other.calls().is_empty());
    }
}
