//! Recording doubles for the collaborator traits.
//!
//! Every double is `Clone` with shared state, so a test can hand one copy to
//! the controller and keep another to steer or inspect it.

use super::{Call, Journal};
use crate::errors::BoothError;
use crate::platform::{AmbientLights, CameraDriver, IoDriver, PrintSpooler};
use crate::types::{
    ButtonId, JobHandle, JobStatus, OutputId, OverlayDuration, OverlayHandle, PreviewSetup,
    PrinterStatus, Resolution, Rgb, TileLayout,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// GPIO double.
#[derive(Debug, Clone)]
pub struct MockIo {
    journal: Journal,
}

impl MockIo {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl IoDriver for MockIo {
    fn set_level(&self, output: OutputId, high: bool) {
        self.journal.record(Call::SetLevel(output, high));
    }

    fn enable_edges(&self, buttons: &[ButtonId]) {
        self.journal.record(Call::EnableEdges(buttons.to_vec()));
    }

    fn disable_edges(&self, buttons: &[ButtonId]) {
        self.journal.record(Call::DisableEdges(buttons.to_vec()));
    }

    fn release(&self) {
        self.journal.record(Call::Release);
    }
}

#[derive(Debug, Default)]
struct CameraState {
    fail_captures: bool,
    write_files: bool,
    next_overlay: u64,
    overlays: Vec<OverlayHandle>,
    text: String,
}

type CaptureHook = Arc<dyn Fn(&Path) + Send + Sync>;

/// Camera double. Timed overlays return immediately.
#[derive(Clone)]
pub struct MockCamera {
    journal: Journal,
    state: Arc<Mutex<CameraState>>,
    on_capture: Arc<Mutex<Option<CaptureHook>>>,
}

impl fmt::Debug for MockCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCamera")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

impl MockCamera {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            state: Arc::new(Mutex::new(CameraState::default())),
            on_capture: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `hook` inside every capture, after it is journaled. Lets a test
    /// deliver button edges while a session is in progress.
    pub fn on_capture(&self, hook: impl Fn(&Path) + Send + Sync + 'static) {
        *lock(&self.on_capture) = Some(Arc::new(hook));
    }

    /// Also write placeholder files for every image the camera produces.
    pub fn with_files(self) -> Self {
        lock(&self.state).write_files = true;
        self
    }

    pub fn fail_captures(&self, fail: bool) {
        lock(&self.state).fail_captures = fail;
    }

    /// Persistent overlays that have not been removed yet.
    pub fn active_overlays(&self) -> Vec<OverlayHandle> {
        lock(&self.state).overlays.clone()
    }

    /// Status text currently on screen, empty when cleared.
    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    fn produce(&self, path: &Path, content: &[u8]) -> Result<(), BoothError> {
        if lock(&self.state).write_files {
            fs::write(path, content)?;
        }
        Ok(())
    }
}

impl CameraDriver for MockCamera {
    fn start_preview(&mut self, setup: PreviewSetup) -> Result<(), BoothError> {
        self.journal.record(Call::StartPreview(setup));
        Ok(())
    }

    fn capture(&mut self, resolution: Resolution, path: &Path) -> Result<(), BoothError> {
        self.journal.record(Call::Capture {
            resolution,
            path: path.to_path_buf(),
        });
        let hook = lock(&self.on_capture).clone();
        if let Some(hook) = hook {
            hook(path);
        }
        if lock(&self.state).fail_captures {
            return Err(BoothError::Capture("camera did not respond".into()));
        }
        self.produce(path, resolution.to_string().as_bytes())
    }

    fn show_overlay(
        &mut self,
        image: &Path,
        layer: u8,
        duration: OverlayDuration,
    ) -> Result<Option<OverlayHandle>, BoothError> {
        let persistent = duration == OverlayDuration::Persistent;
        self.journal.record(Call::ShowOverlay {
            image: image.to_path_buf(),
            layer,
            persistent,
        });
        if !persistent {
            return Ok(None);
        }
        let mut state = lock(&self.state);
        state.next_overlay += 1;
        let handle = OverlayHandle(state.next_overlay);
        state.overlays.push(handle);
        Ok(Some(handle))
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) -> Result<(), BoothError> {
        self.journal.record(Call::RemoveOverlay(handle));
        lock(&self.state).overlays.retain(|h| *h != handle);
        Ok(())
    }

    fn set_preview_visible(&mut self, visible: bool) -> Result<(), BoothError> {
        self.journal.record(Call::Preview(visible));
        Ok(())
    }

    fn countdown(&mut self, seconds: u32) -> Result<(), BoothError> {
        self.journal.record(Call::Countdown(seconds));
        Ok(())
    }

    fn composite(
        &mut self,
        shots: &[PathBuf],
        layout: TileLayout,
        output: &Path,
    ) -> Result<PathBuf, BoothError> {
        self.journal.record(Call::Composite {
            shots: shots.to_vec(),
            layout,
            output: output.to_path_buf(),
        });
        self.produce(output, layout.to_string().as_bytes())?;
        Ok(output.to_path_buf())
    }

    fn concat_label(
        &mut self,
        image: &Path,
        _image_size: Resolution,
        label: &Path,
        _label_size: Resolution,
        output: &Path,
    ) -> Result<PathBuf, BoothError> {
        self.journal.record(Call::ConcatLabel {
            image: image.to_path_buf(),
            label: label.to_path_buf(),
            output: output.to_path_buf(),
        });
        self.produce(output, b"labelled")?;
        Ok(output.to_path_buf())
    }

    fn show_text(&mut self, text: &str) -> Result<(), BoothError> {
        self.journal.record(Call::ShowText(text.to_string()));
        lock(&self.state).text = text.to_string();
        Ok(())
    }

    fn stop(&mut self) {
        self.journal.record(Call::CameraStop);
    }
}

#[derive(Debug, Default)]
struct LightsState {
    frames: usize,
    last: Vec<Rgb>,
}

/// LED strip double. Rainbow frames are counted, not journaled.
#[derive(Debug, Clone)]
pub struct MockLights {
    journal: Journal,
    pixel_count: usize,
    state: Arc<Mutex<LightsState>>,
}

impl MockLights {
    pub fn new(journal: Journal, pixel_count: usize) -> Self {
        Self {
            journal,
            pixel_count,
            state: Arc::new(Mutex::new(LightsState::default())),
        }
    }

    pub fn frames_shown(&self) -> usize {
        lock(&self.state).frames
    }

    pub fn last_frame(&self) -> Vec<Rgb> {
        lock(&self.state).last.clone()
    }
}

impl AmbientLights for MockLights {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn set_pixels(&mut self, colors: &[Rgb]) {
        let mut state = lock(&self.state);
        state.frames += 1;
        state.last = colors.to_vec();
    }

    fn fill(&mut self, color: Rgb) {
        self.journal.record(Call::Fill(color));
        lock(&self.state).last = vec![color; self.pixel_count];
    }

    fn clear(&mut self) {
        self.journal.record(Call::LightsClear);
        lock(&self.state).last = vec![Rgb::OFF; self.pixel_count];
    }
}

#[derive(Debug, Default)]
struct SpoolerState {
    next_job: u32,
    /// Outstanding jobs and how many times each was reported outstanding
    outstanding: Vec<(JobHandle, u32)>,
    auto_complete_after: Option<u32>,
    printer_fault: Option<String>,
    held: Option<String>,
    unreachable: bool,
    submissions: Vec<PathBuf>,
}

/// Print queue double.
#[derive(Debug, Clone)]
pub struct MockSpooler {
    journal: Journal,
    state: Arc<Mutex<SpoolerState>>,
}

impl MockSpooler {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            state: Arc::new(Mutex::new(SpoolerState::default())),
        }
    }

    /// Every outstanding job leaves the queue.
    pub fn complete_all(&self) {
        lock(&self.state).outstanding.clear();
    }

    /// Jobs leave the queue after being reported outstanding `polls` times.
    pub fn auto_complete_after(&self, polls: u32) {
        lock(&self.state).auto_complete_after = Some(polls);
    }

    pub fn set_printer_fault(&self, message: Option<&str>) {
        lock(&self.state).printer_fault = message.map(str::to_string);
    }

    /// Report every job as held with this reason.
    pub fn hold_jobs(&self, reason: Option<&str>) {
        lock(&self.state).held = reason.map(str::to_string);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.state).unreachable = unreachable;
    }

    /// Paths of every accepted submission, in order.
    pub fn submissions(&self) -> Vec<PathBuf> {
        lock(&self.state).submissions.clone()
    }

    pub fn outstanding(&self) -> Vec<JobHandle> {
        lock(&self.state).outstanding.iter().map(|(h, _)| *h).collect()
    }

    fn reachable(&self) -> Result<MutexGuard<'_, SpoolerState>, BoothError> {
        let state = lock(&self.state);
        if state.unreachable {
            return Err(BoothError::Spooler("print server unreachable".into()));
        }
        Ok(state)
    }
}

impl PrintSpooler for MockSpooler {
    fn submit(&mut self, path: &Path) -> Result<JobHandle, BoothError> {
        self.journal.record(Call::Submit(path.to_path_buf()));
        let mut state = self.reachable()?;
        state.next_job += 1;
        let handle = JobHandle(state.next_job);
        state.outstanding.push((handle, 0));
        state.submissions.push(path.to_path_buf());
        Ok(handle)
    }

    fn is_outstanding(&mut self, job: JobHandle) -> Result<bool, BoothError> {
        let mut state = self.reachable()?;
        let limit = state.auto_complete_after;
        let Some(index) = state.outstanding.iter().position(|(h, _)| *h == job) else {
            return Ok(false);
        };
        if let Some(limit) = limit {
            if state.outstanding[index].1 >= limit {
                state.outstanding.remove(index);
                return Ok(false);
            }
        }
        state.outstanding[index].1 += 1;
        Ok(true)
    }

    fn printer_status(&mut self) -> Result<PrinterStatus, BoothError> {
        let state = self.reachable()?;
        Ok(match &state.printer_fault {
            Some(message) => PrinterStatus::Fault(message.clone()),
            None => PrinterStatus::Healthy,
        })
    }

    fn job_status(&mut self, _job: JobHandle) -> Result<JobStatus, BoothError> {
        let state = self.reachable()?;
        Ok(match &state.held {
            Some(reason) => JobStatus::Held(reason.clone()),
            None => JobStatus::Ok,
        })
    }

    fn cancel(&mut self, job: JobHandle) -> Result<(), BoothError> {
        self.journal.record(Call::Cancel(job));
        self.reachable()?.outstanding.retain(|(h, _)| *h != job);
        Ok(())
    }

    fn enable_printer(&mut self) -> Result<(), BoothError> {
        self.journal.record(Call::EnablePrinter);
        self.reachable().map(|_| ())
    }

    fn cancel_all(&mut self) -> Result<(), BoothError> {
        self.journal.record(Call::CancelAll);
        self.reachable()?.outstanding.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spooler_auto_completes() {
        let mut spooler = MockSpooler::new(Journal::new());
        spooler.auto_complete_after(2);
        let job = spooler.submit(Path::new("a.jpg")).unwrap();

        assert!(spooler.is_outstanding(job).unwrap());
        assert!(spooler.is_outstanding(job).unwrap());
        assert!(!spooler.is_outstanding(job).unwrap());
        assert!(spooler.outstanding().is_empty());
    }

    #[test]
    fn test_unreachable_spooler_errors() {
        let mut spooler = MockSpooler::new(Journal::new());
        spooler.set_unreachable(true);
        let err = spooler.submit(Path::new("a.jpg")).unwrap_err();
        assert!(matches!(err, BoothError::Spooler(_)));
        assert!(spooler.submissions().is_empty());
    }

    #[test]
    fn test_camera_tracks_overlays() {
        let journal = Journal::new();
        let mut camera = MockCamera::new(journal.clone());
        let observer = camera.clone();

        let handle = camera
            .show_overlay(Path::new("intro.png"), 4, OverlayDuration::Persistent)
            .unwrap()
            .unwrap();
        assert_eq!(observer.active_overlays(), vec![handle]);
        camera.remove_overlay(handle).unwrap();
        assert!(observer.active_overlays().is_empty());
    }
}
