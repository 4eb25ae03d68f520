//! framecv – host layer
//!
//! Glue between a host that owns RGBA frame buffers and the rest of the
//! workspace.  A [`FrameProcessor`] pairs one [`FrameTask`] (face boxes or
//! brightness) with one display surface; [`ffi`] exposes it to the host as
//! `doOpenCvTask`.

use thiserror::Error;

pub mod ffi;
mod processor;
mod task;

pub use processor::{FrameProcessor, FrameSink};
pub use task::{BrightnessTask, FaceBoxTask, FrameTask, BOX_COLOR, BOX_THICKNESS};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Frame(#[from] framecv_frame::FrameError),
    #[error(transparent)]
    Detect(#[from] framecv_detect::DetectError),
    #[error(transparent)]
    Surface(#[from] framecv_surface::SurfaceError),
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("No frame processor installed")]
    NotInstalled,
    #[error("Frame processor is busy (re-entrant call)")]
    Busy,
}

pub type Result<T> = std::result::Result<T, ProcessError>;
