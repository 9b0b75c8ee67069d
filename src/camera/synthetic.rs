use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::config::CameraConfig;
use crate::camera::{Frame, FrameSource};
use crate::Error;

/// Camera stand-in for runs without real frames: emits flat mid-gray frames
/// of the configured size and, when `failure_rate` is set, drops some of
/// them so the skip path gets exercised in a live demo.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    failure_rate: f32,
    rng: StdRng,
}

impl SyntheticCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            failure_rate: config.failure_rate,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn seeded(width: u32, height: u32, failure_rate: f32, seed: u64) -> Self {
        Self {
            width,
            height,
            failure_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> crate::Result<Frame> {
        if self.failure_rate > 0.0 && self.rng.gen::<f32>() < self.failure_rate {
            return Err(Error::Acquisition(
                "synthetic camera dropped the frame".to_string(),
            ));
        }
        let len = (self.width * self.height * 3) as usize;
        Ok(Frame::new(vec![0x80; len], self.width, self.height))
    }
}
