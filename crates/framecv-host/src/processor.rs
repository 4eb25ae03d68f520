//! Frame processor: one task, one surface.

use crate::{FrameTask, Result};
use framecv_frame::{mat_bytes, FrameView};
use framecv_surface::DisplaySurface;
use log::{debug, trace};
use std::time::Instant;

/// Something that accepts host frames.  Object-safe so the FFI layer can
/// hold any processor.
pub trait FrameSink {
    fn submit(&mut self, frame: FrameView<'_>, param: i32) -> Result<()>;

    /// `false` once the output has been closed.
    fn is_open(&mut self) -> bool {
        true
    }
}

/// Runs a [`FrameTask`] on each frame and presents the result.
pub struct FrameProcessor<S> {
    surface: S,
    task: Box<dyn FrameTask>,
    frames: u64,
}

impl<S: DisplaySurface> FrameProcessor<S> {
    pub fn new(surface: S, task: impl FrameTask + 'static) -> Self {
        debug!("frame processor: task {}, surface {:?}", task.name(), surface.size());
        Self { surface, task: Box::new(task), frames: 0 }
    }

    /// Transform `frame` and flip it to the surface.  Nothing is presented
    /// if any step fails.
    pub fn process(&mut self, frame: FrameView<'_>, param: i32) -> Result<()> {
        let started = Instant::now();
        let rgba = self.task.apply(&frame, param)?;
        self.surface.present(mat_bytes(&rgba)?)?;
        self.frames += 1;
        trace!(
            "{} frame {} ({}x{}, param {}) in {:?}",
            self.task.name(),
            self.frames,
            frame.width(),
            frame.height(),
            param,
            started.elapsed()
        );
        Ok(())
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn task_name(&self) -> &'static str {
        self.task.name()
    }
}

impl<S: DisplaySurface> FrameSink for FrameProcessor<S> {
    fn submit(&mut self, frame: FrameView<'_>, param: i32) -> Result<()> {
        self.process(frame, param)
    }

    fn is_open(&mut self) -> bool {
        self.surface.is_open()
    }
}
