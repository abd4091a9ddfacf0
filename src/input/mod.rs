//! Debounced button input.
//!
//! Edge callbacks run on the GPIO driver's threads and only ever set a flag.
//! The control loop is the single reader: it polls and clears. All lines
//! live in one table keyed by [`ButtonId`]; enabling or disabling a group of
//! buttons is a filtered pass over that table.

use crate::config::IoConfig;
use crate::platform::Outputs;
use crate::types::{ButtonId, OutputId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Logical events raised by button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    SingleModeSelect,
    MultiModeSelect,
    PrintRequest,
    CaptureRequest,
    ExitRequest,
    RelayPulse,
    RetryPrint,
}

impl InputEvent {
    pub fn button(&self) -> ButtonId {
        match self {
            InputEvent::SingleModeSelect => ButtonId::Single,
            InputEvent::MultiModeSelect => ButtonId::Multi,
            InputEvent::PrintRequest => ButtonId::Print,
            InputEvent::CaptureRequest => ButtonId::Dome,
            InputEvent::ExitRequest => ButtonId::Exit,
            InputEvent::RelayPulse => ButtonId::Relay,
            InputEvent::RetryPrint => ButtonId::RetryPrint,
        }
    }

    pub fn for_button(id: ButtonId) -> Self {
        match id {
            ButtonId::Single => InputEvent::SingleModeSelect,
            ButtonId::Multi => InputEvent::MultiModeSelect,
            ButtonId::Print => InputEvent::PrintRequest,
            ButtonId::Dome => InputEvent::CaptureRequest,
            ButtonId::Exit => InputEvent::ExitRequest,
            ButtonId::Relay => InputEvent::RelayPulse,
            ButtonId::RetryPrint => InputEvent::RetryPrint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCaps {
    /// On the front panel: capture, print and mode selection.
    pub is_front: bool,
    /// Must stay live at all times.
    pub is_critical: bool,
}

pub fn capabilities(id: ButtonId) -> LineCaps {
    match id {
        ButtonId::Single | ButtonId::Multi | ButtonId::Print | ButtonId::Dome => LineCaps {
            is_front: true,
            is_critical: false,
        },
        ButtonId::Exit | ButtonId::Relay => LineCaps {
            is_front: false,
            is_critical: true,
        },
        ButtonId::RetryPrint => LineCaps {
            is_front: false,
            is_critical: false,
        },
    }
}

/// Groups of lines the controller switches together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSet {
    Front,
    /// Everything that may be switched off: the front plus retry.
    Interactive,
    Critical,
}

impl ButtonSet {
    pub fn contains(&self, id: ButtonId) -> bool {
        let caps = capabilities(id);
        match self {
            ButtonSet::Front => caps.is_front,
            ButtonSet::Interactive => !caps.is_critical,
            ButtonSet::Critical => caps.is_critical,
        }
    }
}

struct Line {
    id: ButtonId,
    wired: bool,
    enabled: AtomicBool,
    pressed: AtomicBool,
    /// Millis since the bank epoch of the last accepted edge, plus one. 0 = never.
    last_edge: AtomicU64,
}

/// State shared between edge callbacks and the control loop.
pub struct InputBank {
    lines: Vec<Line>,
    mode_multi: AtomicBool,
    outputs: Outputs,
    debounce_ms: u64,
    epoch: Instant,
}

impl InputBank {
    fn new(io: &IoConfig, outputs: Outputs) -> Self {
        let lines = ButtonId::ALL
            .iter()
            .map(|id| Line {
                id: *id,
                wired: io.button_pin(*id).is_some(),
                enabled: AtomicBool::new(false),
                pressed: AtomicBool::new(false),
                last_edge: AtomicU64::new(0),
            })
            .collect();

        let bank = Self {
            lines,
            mode_multi: AtomicBool::new(false),
            outputs,
            debounce_ms: io.debounce_ms,
            epoch: Instant::now(),
        };
        bank.echo_mode(false);
        bank
    }

    fn line(&self, id: ButtonId) -> &Line {
        // ButtonId::ALL order matches the enum declaration order.
        &self.lines[id as usize]
    }

    /// Falling edge on a physical line. Returns whether it raised a flag.
    pub fn on_falling_edge(&self, id: ButtonId) -> bool {
        self.on_falling_edge_at(id, Instant::now())
    }

    pub fn on_falling_edge_at(&self, id: ButtonId, at: Instant) -> bool {
        let line = self.line(id);
        if !line.wired || !line.enabled.load(Ordering::Acquire) {
            return false;
        }

        let stamp = at.saturating_duration_since(self.epoch).as_millis() as u64 + 1;
        let window = self.debounce_ms;
        let accepted = line
            .last_edge
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last != 0 && stamp.saturating_sub(last) < window {
                    None
                } else {
                    Some(stamp)
                }
            })
            .is_ok();
        if !accepted {
            return false;
        }

        match id {
            ButtonId::Single => self.select_mode(false),
            ButtonId::Multi => self.select_mode(true),
            _ => {}
        }
        line.pressed.store(true, Ordering::Release);
        true
    }

    fn select_mode(&self, multi: bool) {
        self.mode_multi.store(multi, Ordering::Release);
        self.echo_mode(multi);
    }

    fn echo_mode(&self, multi: bool) {
        self.outputs.set(OutputId::LedSingle, !multi);
        self.outputs.set(OutputId::LedMulti, multi);
    }

    fn raise(&self, id: ButtonId) {
        self.line(id).pressed.store(true, Ordering::Release);
    }
}

/// Cloneable entry point for callback contexts.
#[derive(Clone)]
pub struct InputHandle {
    bank: Arc<InputBank>,
}

impl InputHandle {
    /// Deliver a falling edge from the driver.
    pub fn press(&self, id: ButtonId) -> bool {
        self.bank.on_falling_edge(id)
    }

    pub fn press_at(&self, id: ButtonId, at: Instant) -> bool {
        self.bank.on_falling_edge_at(id, at)
    }

    /// Raise the exit flag from software, e.g. a signal handler.
    pub fn request_exit(&self) {
        self.bank.raise(ButtonId::Exit);
    }

    /// Latch a flag the way an edge that passed the enable check just
    /// before a disable would.
    #[cfg(test)]
    pub(crate) fn latch(&self, id: ButtonId) {
        self.bank.raise(id);
    }
}

/// Control-loop side of the input table.
pub struct Debouncer {
    bank: Arc<InputBank>,
}

impl Debouncer {
    pub fn new(io: &IoConfig, outputs: Outputs) -> Self {
        Self {
            bank: Arc::new(InputBank::new(io, outputs)),
        }
    }

    pub fn handle(&self) -> InputHandle {
        InputHandle {
            bank: self.bank.clone(),
        }
    }

    pub fn poll(&self, event: InputEvent) -> bool {
        self.bank
            .line(event.button())
            .pressed
            .load(Ordering::Acquire)
    }

    pub fn reset(&self, event: InputEvent) {
        self.bank
            .line(event.button())
            .pressed
            .store(false, Ordering::Release);
    }

    /// Poll and reset in one step.
    pub fn take(&self, event: InputEvent) -> bool {
        self.bank
            .line(event.button())
            .pressed
            .swap(false, Ordering::AcqRel)
    }

    pub fn is_mode_multi(&self) -> bool {
        self.bank.mode_multi.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self, id: ButtonId) -> bool {
        self.bank.line(id).enabled.load(Ordering::Acquire)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.bank.debounce_ms)
    }

    pub fn enable(&self, set: ButtonSet) {
        let switched = self.switch(set, true);
        if !switched.is_empty() {
            log::debug!("Enabled buttons {:?}", switched);
            self.bank.outputs.driver().enable_edges(&switched);
        }
    }

    pub fn disable(&self, set: ButtonSet) {
        let switched = self.switch(set, false);
        if !switched.is_empty() {
            log::debug!("Disabled buttons {:?}", switched);
            self.bank.outputs.driver().disable_edges(&switched);
        }
    }

    fn switch(&self, set: ButtonSet, enabled: bool) -> Vec<ButtonId> {
        self.bank
            .lines
            .iter()
            .filter(|line| line.wired && set.contains(line.id))
            .filter(|line| line.enabled.swap(enabled, Ordering::AcqRel) != enabled)
            .map(|line| line.id)
            .collect()
    }
}
