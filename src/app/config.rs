use std::fmt;
use std::path::Path;

use serde::Deserialize;

use config::{Config, ConfigError};

use crate::pipeline::{default_green_times, Density, GreenTimes};
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub lanes: usize,
    pub dwell_ms: u64,
    pub fallback_density: Density,
    pub thresholds: DensityThresholds,
    pub signal: SignalConfig,
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub announce: AnnounceConfig,
}

/// Vehicle-count boundaries for the density buckets: counts below `medium`
/// are Low, counts below `high` are Medium, everything else is High.
#[derive(Debug, Clone, Deserialize)]
pub struct DensityThresholds {
    pub medium: u32,
    pub high: u32,
}

#[derive(Debug, Deserialize)]
pub struct SignalConfig {
    pub green_times: GreenTimes,
    /// Scales every simulated wait (dwell and green hold). 1.0 is real time.
    pub time_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Synthetic,
    Directory,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    pub kind: CameraKind,
    pub width: u32,
    pub height: u32,
    /// Probability in [0, 1] that the synthetic camera drops a frame.
    pub failure_rate: f32,
    pub frame_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Synthetic,
    Tflite,
}

#[derive(Debug, Deserialize)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub min_vehicles: u32,
    pub max_vehicles: u32,
    pub model_filename: String,
    pub label_filename: String,
    pub threshold: f32,
    pub num_threads: u8,
    /// Detection classes that count as a vehicle; everything else is ignored.
    pub vehicle_classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceFormat {
    Text,
    Json,
    None,
}

#[derive(Debug, Deserialize)]
pub struct AnnounceConfig {
    pub format: AnnounceFormat,
}

impl fmt::Display for CameraConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            CameraKind::Synthetic => write!(
                f,
                "synthetic {}x{}, failure rate {}",
                self.width, self.height, self.failure_rate
            ),
            CameraKind::Directory => write!(
                f,
                "directory {}",
                self.frame_dir.as_deref().unwrap_or("<unset>")
            ),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lanes: 4,
            dwell_ms: 2000,
            fallback_density: Density::Low,
            thresholds: DensityThresholds {
                medium: 5,
                high: 15,
            },
            signal: SignalConfig {
                green_times: default_green_times(),
                time_scale: 1.0,
            },
            camera: CameraConfig {
                kind: CameraKind::Synthetic,
                width: 300,
                height: 300,
                failure_rate: 0.0,
                frame_dir: None,
            },
            detector: DetectorConfig {
                kind: DetectorKind::Synthetic,
                min_vehicles: 0,
                max_vehicles: 25,
                model_filename: "models/ssd_mobilenet_v2_coco_quant_postprocess.tflite"
                    .to_string(),
                label_filename: "models/coco_labels.txt".to_string(),
                threshold: 0.6,
                num_threads: 2,
                vehicle_classes: vec![
                    "car".to_string(),
                    "motorcycle".to_string(),
                    "bus".to_string(),
                    "truck".to_string(),
                ],
            },
            announce: AnnounceConfig {
                format: AnnounceFormat::Text,
            },
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("greenwave"))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.lanes == 0 {
            return Err(Error::Configuration("lanes must be at least 1".to_string()));
        }
        if self.thresholds.medium > self.thresholds.high {
            return Err(Error::Configuration(format!(
                "density thresholds are inverted: medium {} > high {}",
                self.thresholds.medium, self.thresholds.high
            )));
        }
        if !(0.0..=1.0).contains(&self.camera.failure_rate) {
            return Err(Error::Configuration(format!(
                "camera failure rate {} is outside [0, 1]",
                self.camera.failure_rate
            )));
        }
        if !self.signal.time_scale.is_finite() || self.signal.time_scale <= 0.0 {
            return Err(Error::Configuration(format!(
                "time scale {} must be a positive number",
                self.signal.time_scale
            )));
        }
        if self.detector.min_vehicles > self.detector.max_vehicles {
            return Err(Error::Configuration(format!(
                "synthetic detector range is inverted: {} > {}",
                self.detector.min_vehicles, self.detector.max_vehicles
            )));
        }
        if self.detector.vehicle_classes.is_empty() {
            return Err(Error::Configuration(
                "vehicle class set is empty, nothing would ever be counted".to_string(),
            ));
        }
        for density in [Density::Low, Density::Medium, Density::High] {
            if !self.signal.green_times.contains_key(&density) {
                return Err(Error::Configuration(format!(
                    "no green time configured for {} density",
                    density
                )));
            }
        }
        if self.camera.kind == CameraKind::Directory && self.camera.frame_dir.is_none() {
            return Err(Error::Configuration(
                "camera kind is 'directory' but no frame_dir is set".to_string(),
            ));
        }
        Ok(())
    }
}
