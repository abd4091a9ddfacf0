//! Collaborator interfaces for the booth hardware.
//!
//! The control core never talks to GPIO, the camera stack, the LED strip or
//! the print spooler directly. Each of those is a thin driver behind one of
//! the traits below, so the core can run against real devices or against the
//! recording doubles in [`crate::testing`].

use crate::config::IoConfig;
use crate::errors::BoothError;
use crate::types::{
    ButtonId, JobHandle, JobStatus, OutputId, OverlayDuration, OverlayHandle, PreviewSetup,
    PrinterStatus, Resolution, Rgb, TileLayout,
};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Button and LED lines.
///
/// Shared between the control thread and the edge callbacks, hence `&self`
/// and `Send + Sync`. Implementations must treat unknown ids as no-ops.
pub trait IoDriver: Send + Sync {
    fn set_level(&self, output: OutputId, high: bool);
    /// Start delivering falling edges for these lines.
    fn enable_edges(&self, buttons: &[ButtonId]);
    /// Stop delivering falling edges for these lines.
    fn disable_edges(&self, buttons: &[ButtonId]);
    /// Return every line to its power-on state.
    fn release(&self);
}

/// Still camera with a preview screen that supports image overlays.
pub trait CameraDriver {
    /// Size the preview to the screen and start it. Called once at startup.
    fn start_preview(&mut self, setup: PreviewSetup) -> Result<(), BoothError>;

    fn capture(&mut self, resolution: Resolution, path: &Path) -> Result<(), BoothError>;

    /// Show an image above the preview. Timed overlays block for their
    /// duration and return `None`.
    fn show_overlay(
        &mut self,
        image: &Path,
        layer: u8,
        duration: OverlayDuration,
    ) -> Result<Option<OverlayHandle>, BoothError>;

    fn remove_overlay(&mut self, handle: OverlayHandle) -> Result<(), BoothError>;

    fn set_preview_visible(&mut self, visible: bool) -> Result<(), BoothError>;

    /// Count down on screen, one second per step. Blocks until done.
    fn countdown(&mut self, seconds: u32) -> Result<(), BoothError>;

    fn composite(
        &mut self,
        shots: &[PathBuf],
        layout: TileLayout,
        output: &Path,
    ) -> Result<PathBuf, BoothError>;

    /// Append `label` beneath `image`, scaling both to the given sizes.
    fn concat_label(
        &mut self,
        image: &Path,
        image_size: Resolution,
        label: &Path,
        label_size: Resolution,
        output: &Path,
    ) -> Result<PathBuf, BoothError>;

    /// Status text drawn over the preview. An empty string clears it.
    fn show_text(&mut self, text: &str) -> Result<(), BoothError>;

    fn stop(&mut self);
}

/// Addressable ambient LED strip.
pub trait AmbientLights {
    fn pixel_count(&self) -> usize;
    fn set_pixels(&mut self, colors: &[Rgb]);
    fn fill(&mut self, color: Rgb);
    fn clear(&mut self);
}

/// Client for the print queue of the booth printer.
pub trait PrintSpooler {
    fn submit(&mut self, path: &Path) -> Result<JobHandle, BoothError>;
    /// Whether the job is still in the active job set.
    fn is_outstanding(&mut self, job: JobHandle) -> Result<bool, BoothError>;
    fn printer_status(&mut self) -> Result<PrinterStatus, BoothError>;
    fn job_status(&mut self, job: JobHandle) -> Result<JobStatus, BoothError>;
    fn cancel(&mut self, job: JobHandle) -> Result<(), BoothError>;
    /// Re-enable the printer and make its queue accept jobs again.
    fn enable_printer(&mut self) -> Result<(), BoothError>;
    fn cancel_all(&mut self) -> Result<(), BoothError>;
}

/// Level outputs filtered to the lines that are actually wired.
#[derive(Clone)]
pub struct Outputs {
    driver: Arc<dyn IoDriver>,
    wired: HashSet<OutputId>,
}

impl Outputs {
    pub fn new(driver: Arc<dyn IoDriver>, io: &IoConfig) -> Self {
        let wired = [
            OutputId::LedSingle,
            OutputId::LedMulti,
            OutputId::LedPrint,
            OutputId::LedDome,
            OutputId::Relay,
        ]
        .into_iter()
        .filter(|id| io.output_pin(*id).is_some())
        .collect();

        Self { driver, wired }
    }

    pub fn is_wired(&self, output: OutputId) -> bool {
        self.wired.contains(&output)
    }

    pub fn set(&self, output: OutputId, high: bool) {
        if self.is_wired(output) {
            self.driver.set_level(output, high);
        }
    }

    /// Close the printer relay for `hold`, then open it again.
    ///
    /// The relay is active low: high holds the current printer state.
    pub fn pulse_relay(&self, hold: Duration) {
        if !self.is_wired(OutputId::Relay) {
            log::debug!("Relay not wired, skipping pulse");
            return;
        }
        log::info!("Pulsing printer relay for {:?}", hold);
        self.driver.set_level(OutputId::Relay, false);
        if !hold.is_zero() {
            std::thread::sleep(hold);
        }
        self.driver.set_level(OutputId::Relay, true);
    }

    pub fn driver(&self) -> &Arc<dyn IoDriver> {
        &self.driver
    }

    pub fn release(&self) {
        self.driver.release();
    }
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outputs").field("wired", &self.wired).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, Journal, MockIo};

    #[test]
    fn test_unwired_outputs_are_noops() {
        let journal = Journal::new();
        let io = IoConfig {
            led_print: None,
            relay: None,
            ..IoConfig::default()
        };
        let outputs = Outputs::new(Arc::new(MockIo::new(journal.clone())), &io);

        outputs.set(OutputId::LedPrint, true);
        outputs.pulse_relay(Duration::ZERO);
        assert!(journal.calls().is_empty());

        outputs.set(OutputId::LedDome, true);
        assert_eq!(journal.calls(), vec![Call::SetLevel(OutputId::LedDome, true)]);
    }

    #[test]
    fn test_relay_pulse_is_low_then_high() {
        let journal = Journal::new();
        let outputs = Outputs::new(Arc::new(MockIo::new(journal.clone())), &IoConfig::default());

        outputs.pulse_relay(Duration::ZERO);
        assert_eq!(
            journal.calls(),
            vec![
                Call::SetLevel(OutputId::Relay, false),
                Call::SetLevel(OutputId::Relay, true),
            ]
        );
    }
}
