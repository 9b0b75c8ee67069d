pub mod config;

use std::error::Error;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::announce::{Announcer, ConsoleAnnouncer, JsonAnnouncer, NullAnnouncer};
use crate::app::config::{
    AnnounceConfig, AnnounceFormat, AppConfig, CameraConfig, CameraKind, DetectorConfig,
    DetectorKind,
};
use crate::camera::{FrameDirSource, FrameSource, SyntheticCamera};
use crate::control::{CycleController, CycleSettings};
#[cfg(feature = "tflite")]
use crate::pipeline::TFLiteDetector;
use crate::pipeline::{SyntheticDetector, VehicleDetector};

type BoxedSource = Box<dyn FrameSource>;
type BoxedDetector = Box<dyn VehicleDetector>;
type BoxedAnnouncer = Box<dyn Announcer>;

pub struct App {
    controller: CycleController<BoxedSource, BoxedDetector, BoxedAnnouncer>,
    stop: CancellationToken,
}

impl App {
    pub fn start(config: AppConfig) -> Result<App, Box<dyn Error>> {
        config.validate()?;

        tracing::info!(%config.camera, "registering frame source");
        let source = build_frame_source(&config.camera)?;
        let detector = build_detector(&config.detector)?;
        let announcer = build_announcer(&config.announce);

        let controller = CycleController::new(
            CycleSettings::from_config(&config),
            source,
            detector,
            announcer,
        );
        Ok(Self {
            controller,
            stop: CancellationToken::new(),
        })
    }

    /// Clone of the stop token; cancelling it ends the loop after the
    /// current cycle.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub async fn run(&mut self) -> crate::Result<()> {
        self.controller.run(self.stop.clone()).await
    }
}

fn build_frame_source(config: &CameraConfig) -> crate::Result<BoxedSource> {
    match config.kind {
        CameraKind::Synthetic => Ok(Box::new(SyntheticCamera::new(config))),
        CameraKind::Directory => {
            let dir = config.frame_dir.as_deref().ok_or_else(|| {
                crate::Error::Configuration(
                    "camera kind is 'directory' but no frame_dir is set".to_string(),
                )
            })?;
            Ok(Box::new(FrameDirSource::new(Path::new(dir))?))
        }
    }
}

fn build_detector(config: &DetectorConfig) -> crate::Result<BoxedDetector> {
    match config.kind {
        DetectorKind::Synthetic => Ok(Box::new(SyntheticDetector::new(config))),
        DetectorKind::Tflite => {
            #[cfg(feature = "tflite")]
            {
                Ok(Box::new(TFLiteDetector::new(config)?))
            }
            #[cfg(not(feature = "tflite"))]
            {
                Err(crate::Error::Configuration(
                    "detector kind is 'tflite' but this build has no tflite support".to_string(),
                ))
            }
        }
    }
}

fn build_announcer(config: &AnnounceConfig) -> BoxedAnnouncer {
    match config.format {
        AnnounceFormat::Text => Box::new(ConsoleAnnouncer),
        AnnounceFormat::Json => Box::new(JsonAnnouncer),
        AnnounceFormat::None => Box::new(NullAnnouncer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_starts_with_the_default_config() {
        assert!(App::start(AppConfig::default()).is_ok());
    }

    #[cfg(not(feature = "tflite"))]
    #[test]
    fn tflite_detector_requires_the_feature() {
        let mut config = AppConfig::default();
        config.detector.kind = DetectorKind::Tflite;
        assert!(App::start(config).is_err());
    }
}
