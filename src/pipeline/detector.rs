use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::config::DetectorConfig;
use crate::camera::Frame;

#[derive(Clone, Debug)]
pub struct Detection {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
    pub score: f32,
    pub class: String,
}

pub type Detections = Vec<Detection>;

/// Backend seam for the object detector: given one frame, return everything
/// it sees. Counting and classification happen downstream.
pub trait VehicleDetector {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections>;
}

impl<D: VehicleDetector + ?Sized> VehicleDetector for Box<D> {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections> {
        (**self).detect(frame)
    }
}

/// Counts the detections whose class is in the configured vehicle set;
/// anything else (people, animals, ...) does not contribute.
pub fn count_vehicles(detections: &Detections, vehicle_classes: &[String]) -> u32 {
    detections
        .iter()
        .filter(|det| vehicle_classes.iter().any(|class| class == &det.class))
        .count() as u32
}

/// Stand-in detector for runs without a model: emits a random number of
/// detections per frame, mixing vehicle and non-vehicle classes so the
/// category filter actually earns its keep.
pub struct SyntheticDetector {
    min: u32,
    max: u32,
    rng: StdRng,
}

const SYNTHETIC_CLASSES: &[&str] = &[
    "car",
    "motorcycle",
    "bus",
    "truck",
    "person",
    "bicycle",
    "dog",
];

impl SyntheticDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min: config.min_vehicles,
            max: config.max_vehicles,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn seeded(min: u32, max: u32, seed: u64) -> Self {
        Self {
            min,
            max,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VehicleDetector for SyntheticDetector {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections> {
        let count = self.rng.gen_range(self.min..=self.max);
        let width = frame.width.max(2) as i32;
        let height = frame.height.max(2) as i32;
        let mut detections = Detections::with_capacity(count as usize);
        for _ in 0..count {
            let xmin = self.rng.gen_range(0..width / 2);
            let ymin = self.rng.gen_range(0..height / 2);
            let class = SYNTHETIC_CLASSES[self.rng.gen_range(0..SYNTHETIC_CLASSES.len())];
            detections.push(Detection {
                xmin,
                ymin,
                xmax: self.rng.gen_range(xmin + 1..width),
                ymax: self.rng.gen_range(ymin + 1..height),
                score: self.rng.gen_range(0.6..1.0),
                class: class.to_string(),
            });
        }
        Ok(detections)
    }
}
