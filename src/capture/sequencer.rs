use super::{CaptureMode, CaptureSession};
use crate::config::{CameraConfig, StorageConfig};
use crate::errors::BoothError;
use crate::platform::CameraDriver;
use crate::types::{OverlayDuration, Resolution, TileLayout, LAYER_CUE};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Drives single and multi-shot sessions on the camera.
#[derive(Debug, Clone)]
pub struct CaptureSequencer {
    /// Full photo size, label already subtracted when a label is active
    photo: Resolution,
    label: Option<Label>,
    image_count: u32,
    prep_delay: Duration,
    countdown_secs: u32,
    tile_spacing: u32,
    images_folder: PathBuf,
    assets_dir: PathBuf,
    last_base: Option<String>,
}

#[derive(Debug, Clone)]
struct Label {
    path: PathBuf,
    height: u32,
}

impl CaptureSequencer {
    /// The label asset is looked up once here; if it is missing, labels stay
    /// off for the lifetime of the sequencer.
    pub fn new(camera: &CameraConfig, storage: &StorageConfig) -> Self {
        let label = match &camera.label_path {
            Some(path) if path.exists() => Some(Label {
                path: path.clone(),
                height: camera.label_height,
            }),
            Some(path) => {
                log::warn!("Label {:?} not found, compositing without label", path);
                None
            }
            None => None,
        };

        let mut photo = camera.photo_resolution();
        if let Some(label) = &label {
            photo.height = photo.height.saturating_sub(label.height);
        }

        Self {
            photo,
            label,
            image_count: camera.image_count,
            prep_delay: Duration::from_secs(camera.prep_delay_secs),
            countdown_secs: camera.countdown_secs,
            tile_spacing: camera.tile_spacing,
            images_folder: storage.images_folder.clone(),
            assets_dir: camera.assets_dir.clone(),
            last_base: None,
        }
    }

    pub fn label_enabled(&self) -> bool {
        self.label.is_some()
    }

    pub fn mode_for(&self, multi: bool) -> CaptureMode {
        if multi && self.image_count > 1 {
            CaptureMode::Multi(self.image_count)
        } else {
            CaptureMode::Single
        }
    }

    /// Per-shot resolution. Multi shots are a quadrant minus the tile border.
    pub fn shot_resolution(&self, mode: CaptureMode) -> Resolution {
        match mode {
            CaptureMode::Single => self.photo,
            CaptureMode::Multi(_) => {
                let border = 2 * self.tile_spacing;
                Resolution::new(
                    half_rounded(self.photo.width).saturating_sub(border),
                    half_rounded(self.photo.height).saturating_sub(border),
                )
            }
        }
    }

    pub fn begin_session(&mut self, mode: CaptureMode) -> CaptureSession {
        self.begin_session_at(mode, Local::now().naive_local())
    }

    pub fn begin_session_at(&mut self, mode: CaptureMode, now: NaiveDateTime) -> CaptureSession {
        let stamp = now.format("%Y-%m-%d_%H-%M-%S").to_string();
        let base = match &self.last_base {
            Some(last) if last.starts_with(&stamp) => {
                // Same second as the previous session.
                let n = last
                    .rsplit_once('_')
                    .and_then(|(_, n)| n.parse::<u32>().ok())
                    .unwrap_or(1);
                format!("{}_{}", stamp, n + 1)
            }
            _ => stamp,
        };
        self.last_base = Some(base.clone());

        log::info!("New {:?} session {}", mode, base);
        CaptureSession::new(self.images_folder.join(base), mode)
    }

    /// Cue, count down and take the next shot of the session.
    pub fn capture_next(
        &self,
        camera: &mut dyn CameraDriver,
        session: &mut CaptureSession,
    ) -> Result<PathBuf, BoothError> {
        if session.shots_complete() {
            return Err(BoothError::SessionState(format!(
                "session already has {} of {} shots",
                session.shot_paths.len(),
                session.mode.shot_count()
            )));
        }

        let number = session.shot_paths.len() as u32 + 1;
        let cue = if number > 1 {
            "get_ready_next.png"
        } else {
            "get_ready.png"
        };
        camera.show_overlay(
            &self.assets_dir.join(cue),
            LAYER_CUE,
            OverlayDuration::Timed(self.prep_delay),
        )?;

        let path = session.shot_file(number);
        let resolution = self.shot_resolution(session.mode);

        camera.set_preview_visible(true)?;
        let shot = camera
            .countdown(self.countdown_secs)
            .and_then(|_| camera.capture(resolution, &path));
        let hidden = camera.set_preview_visible(false);
        shot?;
        hidden?;

        log::info!("Photo saved: {:?} ({})", path, resolution);
        session.shot_paths.push(path.clone());
        Ok(path)
    }

    /// Tile the shots and append the label. Stores and returns the final path.
    pub fn finish_session(
        &self,
        camera: &mut dyn CameraDriver,
        session: &mut CaptureSession,
    ) -> Result<PathBuf, BoothError> {
        if !session.shots_complete() {
            return Err(BoothError::SessionState(format!(
                "cannot composite after {} of {} shots",
                session.shot_paths.len(),
                session.mode.shot_count()
            )));
        }

        log::info!("Processing...");
        let processing = camera.show_overlay(
            &self.assets_dir.join("processing.png"),
            LAYER_CUE,
            OverlayDuration::Persistent,
        )?;

        let merged = self.merge(camera, session);

        if let Some(handle) = processing {
            camera.remove_overlay(handle)?;
        }
        let composite = merged?;

        log::info!("Images have been merged: {:?}", composite);
        session.composite_path = Some(composite.clone());
        Ok(composite)
    }

    fn merge(
        &self,
        camera: &mut dyn CameraDriver,
        session: &CaptureSession,
    ) -> Result<PathBuf, BoothError> {
        let tiled = match session.mode {
            CaptureMode::Multi(count) => camera.composite(
                &session.shot_paths,
                TileLayout::two_wide(count, self.tile_spacing),
                &session.file("_montageTemp.jpg"),
            )?,
            CaptureMode::Single => session.shot_paths[0].clone(),
        };

        match &self.label {
            Some(label) => camera.concat_label(
                &tiled,
                self.photo,
                &label.path,
                Resolution::new(self.photo.width, label.height),
                &session.file("_montage.jpg"),
            ),
            None => Ok(tiled),
        }
    }

    pub fn images_folder(&self) -> &Path {
        &self.images_folder
    }
}

fn half_rounded(value: u32) -> u32 {
    (value + 1) / 2
}
