//! Shared value types passed between the control core and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Logical button lines on the booth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonId {
    Single,
    Multi,
    Print,
    Dome,
    Exit,
    Relay,
    RetryPrint,
}

impl ButtonId {
    pub const ALL: [ButtonId; 7] = [
        ButtonId::Single,
        ButtonId::Multi,
        ButtonId::Print,
        ButtonId::Dome,
        ButtonId::Exit,
        ButtonId::Relay,
        ButtonId::RetryPrint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonId::Single => "single",
            ButtonId::Multi => "multi",
            ButtonId::Print => "print",
            ButtonId::Dome => "dome",
            ButtonId::Exit => "exit",
            ButtonId::Relay => "relay",
            ButtonId::RetryPrint => "retry",
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ButtonId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            "print" => Ok(Self::Print),
            "dome" => Ok(Self::Dome),
            "exit" => Ok(Self::Exit),
            "relay" => Ok(Self::Relay),
            "retry" => Ok(Self::RetryPrint),
            _ => Err(()),
        }
    }
}

/// Level-set outputs: indicator LEDs and the printer power relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputId {
    LedSingle,
    LedMulti,
    LedPrint,
    LedDome,
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Screen geometry and mirroring handed to the camera before the preview starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSetup {
    pub screen: Resolution,
    pub preview_hflip: bool,
    pub photo_hflip: bool,
}

/// Opaque id of an overlay on the camera preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// Preview overlay stacking order. Higher layers draw on top.
pub const LAYER_CUE: u8 = 4;
pub const LAYER_RESULT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayDuration {
    /// Driver shows the overlay, waits, and removes it before returning.
    Timed(Duration),
    /// Overlay stays until removed by handle.
    Persistent,
}

/// Grid used when tiling several shots into one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub columns: u32,
    pub rows: u32,
    /// Border in pixels around every tile.
    pub spacing: u32,
}

impl TileLayout {
    /// Two columns, as many rows as needed for `count` tiles.
    pub fn two_wide(count: u32, spacing: u32) -> Self {
        Self {
            columns: 2,
            rows: count.div_ceil(2),
            spacing,
        }
    }
}

impl fmt::Display for TileLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}", self.columns, self.rows, self.spacing)
    }
}

/// Spooler-assigned job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub u32);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterStatus {
    Healthy,
    Fault(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    /// Job is held or stopped in the queue.
    Held(String),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_names_round_trip() {
        for id in ButtonId::ALL {
            assert_eq!(id.as_str().parse::<ButtonId>(), Ok(id));
        }
        assert!("nope".parse::<ButtonId>().is_err());
    }

    #[test]
    fn test_two_wide_layout() {
        assert_eq!(TileLayout::two_wide(4, 10).rows, 2);
        assert_eq!(TileLayout::two_wide(6, 10).rows, 3);
        assert_eq!(TileLayout::two_wide(4, 10).to_string(), "2x2+10");
    }
}
