pub mod files;
pub mod synthetic;
pub use files::FrameDirSource;
pub use synthetic::SyntheticCamera;

/// One raw RGB24 frame.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

/// Lazy, unbounded supply of frames; a request may fail with
/// `Error::Acquisition` and the caller decides what a missing frame means.
pub trait FrameSource {
    fn next_frame(&mut self) -> crate::Result<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> crate::Result<Frame> {
        (**self).next_frame()
    }
}
