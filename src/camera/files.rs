use std::path::{Path, PathBuf};

use crate::camera::{Frame, FrameSource};
use crate::Error;

/// Replays the image files of a directory as an endless frame stream,
/// in filename order, wrapping around at the end.
pub struct FrameDirSource {
    frames: Vec<PathBuf>,
    next: usize,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

impl FrameDirSource {
    pub fn new(dir: &Path) -> crate::Result<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|err| Error::Configuration(format!("frame dir {}: {}", dir.display(), err)))?;
        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| {
                    Error::Configuration(format!("frame dir {}: {}", dir.display(), err))
                })?
                .path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                frames.push(path);
            }
        }
        frames.sort();
        if frames.is_empty() {
            return Err(Error::Configuration(format!(
                "frame dir {} contains no images",
                dir.display()
            )));
        }
        tracing::debug!(dir = %dir.display(), frames = frames.len(), "loaded frame directory");
        Ok(Self { frames, next: 0 })
    }
}

impl FrameSource for FrameDirSource {
    fn next_frame(&mut self) -> crate::Result<Frame> {
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();
        let rgb = image::open(path)
            .map_err(|err| Error::Acquisition(format!("{}: {}", path.display(), err)))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Frame::new(rgb.into_raw(), width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_a_configuration_error() {
        match FrameDirSource::new(Path::new("/nonexistent/frames")) {
            Err(Error::Configuration(_)) => {}
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_directory_is_a_configuration_error() {
        let dir = std::env::temp_dir().join("greenwave-empty-frame-dir");
        std::fs::create_dir_all(&dir).unwrap();
        match FrameDirSource::new(&dir) {
            Err(Error::Configuration(reason)) => assert!(reason.contains("no images")),
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
