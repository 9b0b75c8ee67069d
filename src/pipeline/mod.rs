mod detector;
pub use detector::count_vehicles;
pub use detector::Detection;
pub use detector::Detections;
pub use detector::SyntheticDetector;
pub use detector::VehicleDetector;

mod density;
pub use density::classify;
pub use density::Density;

mod planner;
pub use planner::default_green_times;
pub use planner::plan;
pub use planner::GreenTimes;
pub use planner::SignalPlan;

#[cfg(feature = "tflite")]
mod tflite;
#[cfg(feature = "tflite")]
pub use tflite::TFLiteDetector;
