//! Main control loop.
//!
//! [`Booth`] owns every collaborator and all session state. One call to
//! [`Booth::tick`] is one pass of the cooperative scheduler: indicators,
//! result expiry, print polling, then the button flags in a fixed order.
//! Long operations (capture, compositing, relay pulses) run inline, so at
//! most one of them is ever in flight.

use crate::capture::{storage, CaptureSequencer};
use crate::config::BoothConfig;
use crate::errors::BoothError;
use crate::indicator::IndicatorCoordinator;
use crate::input::{ButtonSet, Debouncer, InputEvent, InputHandle};
use crate::platform::{AmbientLights, CameraDriver, IoDriver, Outputs, PrintSpooler};
use crate::print::{
    Admission, PrintEvent, PrintFault, PrintJobController, PrintState, RejectReason,
};
use crate::types::{OutputId, OverlayDuration, OverlayHandle, LAYER_CUE, LAYER_RESULT};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Hardware collaborators handed to [`Booth::new`].
pub struct Devices<C, S, L> {
    pub camera: C,
    pub spooler: S,
    pub lights: L,
    pub io: Arc<dyn IoDriver>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

/// Composite currently on screen.
#[derive(Debug, Clone)]
struct ShownResult {
    composite: PathBuf,
    overlay: Option<OverlayHandle>,
    hide_at_tick: Option<u64>,
}

pub struct Booth<C: CameraDriver, S: PrintSpooler, L: AmbientLights> {
    config: BoothConfig,
    camera: C,
    spooler: S,
    lights: L,
    outputs: Outputs,
    input: Debouncer,
    sequencer: CaptureSequencer,
    printer: PrintJobController,
    indicators: IndicatorCoordinator,
    tick: u64,
    intro_overlay: Option<OverlayHandle>,
    result: Option<ShownResult>,
    started: bool,
    torn_down: bool,
}

impl<C: CameraDriver, S: PrintSpooler, L: AmbientLights> Booth<C, S, L> {
    pub fn new(config: BoothConfig, devices: Devices<C, S, L>) -> Result<Self, BoothError> {
        config.validate().map_err(BoothError::Config)?;

        let outputs = Outputs::new(devices.io, &config.io);
        let input = Debouncer::new(&config.io, outputs.clone());
        let sequencer = CaptureSequencer::new(&config.camera, &config.storage);
        let indicators = IndicatorCoordinator::new(config.indicator.clone());

        Ok(Self {
            camera: devices.camera,
            spooler: devices.spooler,
            lights: devices.lights,
            outputs,
            input,
            sequencer,
            printer: PrintJobController::new(),
            indicators,
            tick: 0,
            intro_overlay: None,
            result: None,
            started: false,
            torn_down: false,
            config,
        })
    }

    /// Bring folders, screen, printer and buttons into their running state.
    pub fn startup(&mut self) -> Result<(), BoothError> {
        log::info!("Starting booth");
        storage::prepare_folders(
            &self.config.storage.images_folder,
            &self.config.storage.backup_folders,
        )?;
        self.started = true;

        self.camera
            .start_preview(self.config.camera.preview_setup())
            .map_err(|e| BoothError::Initialization(format!("camera preview: {}", e)))?;

        let intro = self.config.camera.asset("intro.png");
        match self
            .camera
            .show_overlay(&intro, LAYER_CUE, OverlayDuration::Persistent)
        {
            Ok(handle) => self.intro_overlay = handle,
            Err(e) => log::warn!("Failed to show intro screen: {}", e),
        }

        // Relay idles high; one pulse switches the printer on.
        self.outputs.set(OutputId::Relay, true);
        self.outputs.pulse_relay(self.config.io.relay_pulse());

        self.printer.prepare_spooler(&mut self.spooler);

        self.input.enable(ButtonSet::Critical);
        self.input.enable(ButtonSet::Interactive);
        log::info!("Booth ready");
        Ok(())
    }

    /// Startup, loop until exit or a fatal fault, then teardown.
    pub fn run(&mut self) -> Result<(), BoothError> {
        let result = self.startup().and_then(|_| self.run_loop());
        if let Err(e) = &result {
            log::error!("Unexpected error: {}", e);
        }
        self.teardown();
        result
    }

    fn run_loop(&mut self) -> Result<(), BoothError> {
        let period = Duration::from_millis(self.config.indicator.tick_ms);
        loop {
            if self.tick()? == TickOutcome::Exit {
                return Ok(());
            }
            std::thread::sleep(period);
        }
    }

    /// One scheduler pass.
    pub fn tick(&mut self) -> Result<TickOutcome, BoothError> {
        self.tick += 1;
        self.show_indicators(false);

        if let Some(hide_at) = self.result.as_ref().and_then(|r| r.hide_at_tick) {
            if self.tick >= hide_at {
                self.hide_result()?;
            }
        }

        if self.input.take(InputEvent::SingleModeSelect) {
            log::info!("Single image mode selected");
        }
        if self.input.take(InputEvent::MultiModeSelect) {
            log::info!("Multi image mode selected");
        }

        if let Some(event) = self.printer.poll(&mut self.spooler) {
            self.on_print_event(event)?;
        }

        if self.input.take(InputEvent::CaptureRequest) {
            log::info!("Dome pressed");
            self.run_session()?;
        }

        if self.input.take(InputEvent::PrintRequest) {
            log::info!("Print pressed");
            self.on_print_request()?;
        }

        if self.input.take(InputEvent::RetryPrint) {
            log::info!("Retry print pressed");
            if self.printer.retry(&mut self.spooler) {
                self.on_print_started()?;
            } else {
                log::info!("No failed print job to retry");
            }
        }

        if self.input.take(InputEvent::RelayPulse) {
            log::info!("Relay pressed");
            self.outputs.pulse_relay(self.config.io.relay_pulse());
        }

        if self.input.take(InputEvent::ExitRequest) {
            log::info!("Exit pressed");
            return Ok(TickOutcome::Exit);
        }

        Ok(TickOutcome::Continue)
    }

    fn show_indicators(&mut self, capture_active: bool) {
        let frame = self
            .indicators
            .frame(self.tick, capture_active, self.printer.state());
        self.indicators.apply(frame, &self.outputs, &mut self.lights);
    }

    fn on_print_event(&mut self, event: PrintEvent) -> Result<(), BoothError> {
        match event {
            PrintEvent::Fault(kind) => {
                let message = self.fault_message(kind).to_string();
                self.camera.show_text(&message)?;
                // Photos can still be taken while the printer is stuck.
                self.input.enable(ButtonSet::Front);
            }
            PrintEvent::Completed => {
                self.camera.show_text("")?;
                self.input.enable(ButtonSet::Front);
            }
            PrintEvent::Printing | PrintEvent::Idle => {}
        }
        Ok(())
    }

    fn fault_message(&self, kind: PrintFault) -> &str {
        let messages = &self.config.messages;
        match kind {
            PrintFault::Ribbon => &messages.error_ribbon,
            PrintFault::Paper => &messages.error_paper,
            PrintFault::Generic => &messages.error_printer,
        }
    }

    fn on_print_request(&mut self) -> Result<(), BoothError> {
        if matches!(self.printer.state(), PrintState::Error(_)) {
            if self.printer.retry(&mut self.spooler) {
                self.on_print_started()?;
            }
            return Ok(());
        }

        let admission = match self.composite().map(Path::to_path_buf) {
            Some(composite) => self.printer.submit(&mut self.spooler, &composite),
            None => Admission::Rejected(RejectReason::NothingToPrint),
        };

        match admission {
            Admission::Accepted => self.on_print_started(),
            Admission::Rejected(reason) => {
                log::info!("Print request dropped: {:?}", reason);
                Ok(())
            }
        }
    }

    fn on_print_started(&mut self) -> Result<(), BoothError> {
        self.input.disable(ButtonSet::Front);
        let message = self.config.messages.printer_started.clone();
        self.camera.show_text(&message)
    }

    /// Capture, composite, display and back up one session.
    fn run_session(&mut self) -> Result<(), BoothError> {
        self.input.disable(ButtonSet::Interactive);

        if self.printer.state() != PrintState::Idle && self.printer.cancel(&mut self.spooler) {
            self.camera.show_text("")?;
        }

        if let Some(intro) = self.intro_overlay.take() {
            self.camera.remove_overlay(intro)?;
        }
        self.hide_result()?;

        let mode = self.sequencer.mode_for(self.input.is_mode_multi());
        let mut session = self.sequencer.begin_session(mode);

        self.show_indicators(true);
        for _ in 0..mode.shot_count() {
            self.sequencer.capture_next(&mut self.camera, &mut session)?;
        }
        self.lights.clear();
        self.indicators.invalidate();

        let composite = self
            .sequencer
            .finish_session(&mut self.camera, &mut session)?;
        self.show_result(composite)?;

        let copied = storage::copy_to_backups(&session.files(), &self.config.storage.backup_folders);
        if copied > 0 {
            log::info!("Copied {} files to backup folders", copied);
        }

        self.input.reset(InputEvent::CaptureRequest);
        self.input.enable(ButtonSet::Interactive);
        Ok(())
    }

    fn show_result(&mut self, composite: PathBuf) -> Result<(), BoothError> {
        let overlay =
            self.camera
                .show_overlay(&composite, LAYER_RESULT, OverlayDuration::Persistent)?;

        let show_secs = self.config.camera.show_image_secs;
        let hide_at_tick = (show_secs > 0).then(|| {
            let ticks = show_secs
                .saturating_mul(1000)
                .div_ceil(self.config.indicator.tick_ms);
            self.tick.saturating_add(ticks)
        });

        self.result = Some(ShownResult {
            composite,
            overlay,
            hide_at_tick,
        });
        Ok(())
    }

    fn hide_result(&mut self) -> Result<(), BoothError> {
        if let Some(shown) = self.result.take() {
            log::debug!("Hiding {:?}", shown.composite);
            if let Some(handle) = shown.overlay {
                self.camera.remove_overlay(handle)?;
            }
        }
        Ok(())
    }

    /// Stop camera, blank the strip, pulse the relay and release all lines.
    ///
    /// Runs once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        log::info!("Shutting down booth");
        self.camera.stop();
        self.lights.clear();
        self.outputs.pulse_relay(self.config.io.relay_pulse());
        self.outputs.release();
        log::info!("Goodbye");
    }

    pub fn input_handle(&self) -> InputHandle {
        self.input.handle()
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn spooler(&self) -> &S {
        &self.spooler
    }

    pub fn lights(&self) -> &L {
        &self.lights
    }

    pub fn print_state(&self) -> PrintState {
        self.printer.state()
    }

    /// Composite currently on display, if any.
    pub fn composite(&self) -> Option<&Path> {
        self.result.as_ref().map(|r| r.composite.as_path())
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl<C: CameraDriver, S: PrintSpooler, L: AmbientLights> Drop for Booth<C, S, L> {
    fn drop(&mut self) {
        if self.started {
            self.teardown();
        }
    }
}
