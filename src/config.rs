//! Configuration management for crabbooth
//!
//! Provides loading, saving and validation of the booth settings: camera
//! geometry, storage folders, I/O pin assignments, indicator timing and the
//! localized status messages shown on the preview.

use crate::errors::BoothError;
use crate::types::{ButtonId, OutputId, PreviewSetup, Resolution};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub io: IoConfig,
    pub indicator: IndicatorConfig,
    pub messages: MessagesConfig,
}

/// Camera and compositing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Photo width in pixels (printer format is 3:2 including the label)
    pub photo_width: u32,
    /// Photo height in pixels, label included
    pub photo_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Number of shots in multi mode
    pub image_count: u32,
    /// Seconds the "get ready" cue stays up before each shot
    pub prep_delay_secs: u64,
    /// Countdown seconds before each shot
    pub countdown_secs: u32,
    /// Seconds the result stays on screen, 0 keeps it until the next session
    pub show_image_secs: u64,
    pub photo_hflip: bool,
    pub preview_hflip: bool,
    /// Label appended under every composite. Ignored if missing at startup.
    pub label_path: Option<PathBuf>,
    pub label_height: u32,
    /// Border around each tile in a multi-shot montage
    pub tile_spacing: u32,
    /// Folder holding intro, get-ready and processing images
    pub assets_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub images_folder: PathBuf,
    /// Extra folders every session is copied into
    pub backup_folders: Vec<PathBuf>,
}

/// GPIO assignments. A pin left out of an `[io]` table is not wired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoConfig {
    pub btn_single: Option<u8>,
    pub btn_multi: Option<u8>,
    pub btn_print: Option<u8>,
    pub btn_dome: Option<u8>,
    pub btn_exit: Option<u8>,
    pub btn_relay: Option<u8>,
    pub btn_retry_print: Option<u8>,
    pub led_single: Option<u8>,
    pub led_multi: Option<u8>,
    pub led_print: Option<u8>,
    pub led_dome: Option<u8>,
    pub relay: Option<u8>,
    /// Number of pixels on the ambient strip
    #[serde(default = "default_pixel_count")]
    pub pixel_count: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long the relay is held closed per pulse
    #[serde(default = "default_relay_pulse_ms")]
    pub relay_pulse_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Control loop period
    pub tick_ms: u64,
    /// Full blink period in ticks, lit for the second half
    pub blink_interval: u64,
    /// Steps in one full rainbow cycle
    pub rainbow_period: u32,
}

/// Localized strings shown on the preview for print status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub printer_started: String,
    pub error_ribbon: String,
    pub error_paper: String,
    pub error_printer: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            photo_width: 1920,
            photo_height: 1280,
            screen_width: 1024,
            screen_height: 600,
            image_count: 4,
            prep_delay_secs: 2,
            countdown_secs: 10,
            show_image_secs: 60,
            photo_hflip: true,
            preview_hflip: false,
            label_path: None,
            label_height: 128,
            tile_spacing: 10,
            assets_dir: PathBuf::from("assets"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_folder: PathBuf::from("photos"),
            backup_folders: Vec::new(),
        }
    }
}

fn default_pixel_count() -> usize {
    14
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_relay_pulse_ms() -> u64 {
    2000
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            btn_single: Some(17),
            btn_multi: Some(22),
            btn_print: Some(27),
            btn_dome: Some(18),
            btn_exit: Some(4),
            btn_relay: Some(23),
            btn_retry_print: None,
            led_single: Some(12),
            led_multi: Some(6),
            led_print: Some(16),
            led_dome: Some(5),
            relay: Some(24),
            pixel_count: default_pixel_count(),
            debounce_ms: default_debounce_ms(),
            relay_pulse_ms: default_relay_pulse_ms(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            blink_interval: 8,
            rainbow_period: 255,
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            printer_started: "Foto wird gedruckt ...".to_string(),
            error_ribbon: "Farbband leer! Bitte wechseln und erneut drucken.".to_string(),
            error_paper: "Papier leer! Bitte nachfüllen und erneut drucken.".to_string(),
            error_printer: "Druckerfehler! Bitte Drucker prüfen.".to_string(),
        }
    }
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            storage: StorageConfig::default(),
            io: IoConfig::default(),
            indicator: IndicatorConfig::default(),
            messages: MessagesConfig::default(),
        }
    }
}

impl IoConfig {
    pub fn button_pin(&self, id: ButtonId) -> Option<u8> {
        match id {
            ButtonId::Single => self.btn_single,
            ButtonId::Multi => self.btn_multi,
            ButtonId::Print => self.btn_print,
            ButtonId::Dome => self.btn_dome,
            ButtonId::Exit => self.btn_exit,
            ButtonId::Relay => self.btn_relay,
            ButtonId::RetryPrint => self.btn_retry_print,
        }
    }

    pub fn output_pin(&self, id: OutputId) -> Option<u8> {
        match id {
            OutputId::LedSingle => self.led_single,
            OutputId::LedMulti => self.led_multi,
            OutputId::LedPrint => self.led_print,
            OutputId::LedDome => self.led_dome,
            OutputId::Relay => self.relay,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn relay_pulse(&self) -> Duration {
        Duration::from_millis(self.relay_pulse_ms)
    }
}

impl CameraConfig {
    pub fn photo_resolution(&self) -> Resolution {
        Resolution::new(self.photo_width, self.photo_height)
    }

    pub fn preview_setup(&self) -> PreviewSetup {
        PreviewSetup {
            screen: Resolution::new(self.screen_width, self.screen_height),
            preview_hflip: self.preview_hflip,
            photo_hflip: self.photo_hflip,
        }
    }

    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets_dir.join(name)
    }
}

impl BoothConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, BoothError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| BoothError::Config(format!("Failed to read config file: {}", e)))?;

        let config: BoothConfig = toml::from_str(&contents)
            .map_err(|e| BoothError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), BoothError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    BoothError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| BoothError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| BoothError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabbooth.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let camera = &self.camera;
        if camera.photo_width == 0 || camera.photo_height == 0 {
            return Err("Invalid photo resolution".to_string());
        }
        if camera.screen_width == 0 || camera.screen_height == 0 {
            return Err("Invalid screen resolution".to_string());
        }
        if camera.image_count != 1 && !(2..=8).contains(&camera.image_count) {
            return Err("Image count must be 1 or between 2 and 8".to_string());
        }
        if camera.image_count > 1 && camera.image_count % 2 != 0 {
            return Err("Multi-shot image count must be even".to_string());
        }
        if camera.label_path.is_some() && camera.label_height >= camera.photo_height {
            return Err("Label height must be smaller than the photo height".to_string());
        }

        if self.indicator.tick_ms == 0 {
            return Err("Tick period must be greater than 0".to_string());
        }
        if self.indicator.blink_interval < 2 {
            return Err("Blink interval must be at least 2 ticks".to_string());
        }
        if self.indicator.rainbow_period == 0 {
            return Err("Rainbow period must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BoothConfig::default();
        assert_eq!(config.camera.photo_resolution(), Resolution::new(1920, 1280));
        assert_eq!(config.camera.image_count, 4);
        assert_eq!(config.indicator.blink_interval, 8);
        assert_eq!(config.io.debounce_ms, 200);
        assert!(config.camera.label_path.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = BoothConfig::default();
        assert!(config.validate().is_ok());

        let mut bad = config.clone();
        bad.camera.photo_width = 0;
        assert!(bad.validate().is_err());

        let mut odd = BoothConfig::default();
        odd.camera.image_count = 3;
        assert!(odd.validate().is_err());

        let mut single_only = BoothConfig::default();
        single_only.camera.image_count = 1;
        assert!(single_only.validate().is_ok());

        let mut blink = BoothConfig::default();
        blink.indicator.blink_interval = 1;
        assert!(blink.validate().is_err());

        let mut label = BoothConfig::default();
        label.camera.label_path = Some(PathBuf::from("label.jpg"));
        label.camera.label_height = 1280;
        assert!(label.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("booth.toml");

        let mut config = BoothConfig::default();
        config.storage.backup_folders = vec![PathBuf::from("/media/usb/photos")];
        config.camera.label_path = Some(PathBuf::from("/media/usb/label.jpg"));
        assert!(config.save_to_file(&config_path).is_ok());

        let loaded = BoothConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[camera]\nimage_count = 6\n\n[io]\nbtn_exit = 21\n").unwrap();

        let loaded = BoothConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.camera.image_count, 6);
        assert_eq!(loaded.camera.photo_width, 1920);
        assert_eq!(loaded.io.btn_exit, Some(21));
        assert_eq!(loaded.io.btn_dome, None);
        assert_eq!(loaded.io.debounce_ms, 200);
        assert_eq!(loaded.messages, MessagesConfig::default());
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&BoothConfig::default()).unwrap();
        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("[io]"));
        assert!(toml_string.contains("[indicator]"));
        assert!(toml_string.contains("[messages]"));
        assert!(toml_string.contains("blink_interval"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = BoothConfig::load_from_file("nonexistent_booth_config.toml");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().camera.image_count, 4);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[camera\nimage_count = ").unwrap();
        assert!(matches!(
            BoothConfig::load_from_file(&path),
            Err(BoothError::Config(_))
        ));
    }

    #[test]
    fn test_unwired_pins() {
        let mut io = IoConfig::default();
        io.btn_print = None;
        assert_eq!(io.button_pin(ButtonId::Print), None);
        assert_eq!(io.button_pin(ButtonId::Dome), Some(18));
        assert_eq!(io.button_pin(ButtonId::RetryPrint), None);
        assert_eq!(io.output_pin(OutputId::Relay), Some(24));
    }
}
