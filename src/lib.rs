//! crabbooth: control core for an unattended photo booth kiosk
//!
//! This crate ties debounced button input, a single or multi-shot capture
//! sequence, image compositing and a fallible print job together under one
//! cooperative control loop, while an LED strip animates continuously.
//!
//! # Features
//! - Lock-free button flags, set by edge callbacks and consumed once
//! - Single and multi-shot sessions with optional label compositing
//! - Print job state machine with fault classification and manual retry
//! - Indicator LEDs derived from controller state every tick
//! - Guaranteed teardown on exit or fatal fault
//!
//! Hardware stays behind the traits in [`platform`]. The [`testing`] module
//! provides recording doubles for all of them.
//!
//! ```rust,ignore
//! use crabbooth::{Booth, BoothConfig, Devices};
//!
//! let mut booth = Booth::new(BoothConfig::load_or_default(), devices)?;
//! booth.run()?;
//! ```
pub mod capture;
pub mod config;
pub mod controller;
pub mod errors;
pub mod indicator;
pub mod input;
pub mod platform;
pub mod print;
pub mod types;

// Testing utilities - recording collaborators for offline runs
pub mod testing;

// Re-exports for convenience
pub use config::BoothConfig;
pub use controller::{Booth, Devices, TickOutcome};
pub use errors::BoothError;
pub use input::{ButtonSet, InputEvent, InputHandle};
pub use print::{PrintFault, PrintState};
pub use types::{ButtonId, OutputId};

/// Initialize logging for the booth
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabbooth=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
