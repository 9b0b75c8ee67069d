pub mod announce;
pub mod app;
pub mod camera;
pub mod control;
pub mod pipeline;

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A frame could not be acquired for a lane.
    Acquisition(String),

    /// The detector failed on an acquired frame.
    Detector(String),

    /// Startup-time misconfiguration, e.g. a density with no green time.
    Configuration(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Acquisition(reason) => write!(f, "frame acquisition failed: {}", reason),
            Error::Detector(reason) => write!(f, "vehicle detection failed: {}", reason),
            Error::Configuration(reason) => write!(f, "configuration error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}
