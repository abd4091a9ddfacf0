//! LED feedback derived from controller state.
//!
//! Nothing here is stored between ticks except what was last written to the
//! hardware, so LED levels are only touched when they change.

use crate::config::IndicatorConfig;
use crate::platform::{AmbientLights, Outputs};
use crate::print::PrintState;
use crate::types::{OutputId, Rgb};

/// Color wheel: red to green to blue and back over 0..=255.
pub fn wheel(pos: u8) -> Rgb {
    let pos = pos as u16;
    if pos < 85 {
        Rgb::new((pos * 3) as u8, (255 - pos * 3) as u8, 0)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb::new((255 - pos * 3) as u8, 0, (pos * 3) as u8)
    } else {
        let pos = pos - 170;
        Rgb::new(0, (pos * 3) as u8, (255 - pos * 3) as u8)
    }
}

/// One rainbow frame, spread evenly over the strip and shifted by `index`.
pub fn rainbow(pixel_count: usize, index: u32) -> Vec<Rgb> {
    (0..pixel_count)
        .map(|i| {
            let offset = (i * 256 / pixel_count) as u32;
            wheel(((offset + index) % 256) as u8)
        })
        .collect()
}

/// Second half of every `interval` ticks is lit.
pub fn blink_phase(tick: u64, interval: u64) -> bool {
    let interval = interval.max(2);
    tick % interval >= interval / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambient {
    Rainbow(u32),
    /// Solid white while the shutter sequence runs
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorFrame {
    pub ambient: Ambient,
    pub dome_led: bool,
    pub print_led: bool,
}

/// Pure derivation of every indicator from the tick and controller state.
pub fn derive(
    tick: u64,
    capture_active: bool,
    print: PrintState,
    config: &IndicatorConfig,
) -> IndicatorFrame {
    let blink = blink_phase(tick, config.blink_interval);
    let period = u64::from(config.rainbow_period.max(1));

    let ambient = if capture_active {
        Ambient::Flash
    } else {
        Ambient::Rainbow((tick % period) as u32)
    };

    let print_led = match print {
        PrintState::Submitted => true,
        PrintState::Printing => blink,
        PrintState::Idle | PrintState::Completed | PrintState::Error(_) => false,
    };

    IndicatorFrame {
        ambient,
        dome_led: !capture_active && blink,
        print_led,
    }
}

/// Writes derived frames to the hardware.
#[derive(Debug, Clone)]
pub struct IndicatorCoordinator {
    config: IndicatorConfig,
    last: Option<IndicatorFrame>,
}

impl IndicatorCoordinator {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config, last: None }
    }

    pub fn frame(&self, tick: u64, capture_active: bool, print: PrintState) -> IndicatorFrame {
        derive(tick, capture_active, print, &self.config)
    }

    pub fn apply(
        &mut self,
        frame: IndicatorFrame,
        outputs: &Outputs,
        lights: &mut dyn AmbientLights,
    ) {
        match frame.ambient {
            Ambient::Rainbow(index) => {
                lights.set_pixels(&rainbow(lights.pixel_count(), index));
            }
            Ambient::Flash => {
                if self.last.map(|f| f.ambient) != Some(Ambient::Flash) {
                    lights.fill(Rgb::WHITE);
                }
            }
        }

        let previous = self.last;
        if previous.map(|f| f.dome_led) != Some(frame.dome_led) {
            outputs.set(OutputId::LedDome, frame.dome_led);
        }
        if previous.map(|f| f.print_led) != Some(frame.print_led) {
            outputs.set(OutputId::LedPrint, frame.print_led);
        }
        self.last = Some(frame);
    }

    /// Forget what was written, e.g. after the strip was cleared externally.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
