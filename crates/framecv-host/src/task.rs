//! Per-frame transforms.  Each takes a borrowed RGBA frame and returns an
//! owned RGBA `Mat` of the same size.

use crate::Result;
use framecv_detect::FaceDetector;
use framecv_frame::{adjust_brightness, brightness_delta, to_rgba, ColorOrder, FrameView};
use log::trace;
use opencv::{
    core::{Mat, Rect, Scalar},
    imgproc,
};

/// Outline colour, BGR.
pub const BOX_COLOR: [f64; 3] = [0.0, 105.0, 205.0];
/// Outline stroke width in pixels.
pub const BOX_THICKNESS: i32 = 4;

/// One image transform run once per host call.
pub trait FrameTask {
    fn name(&self) -> &'static str;

    /// `param` is the host's integer argument; tasks that have no use for it
    /// ignore it.
    fn apply(&mut self, frame: &FrameView<'_>, param: i32) -> Result<Mat>;
}

/// Detect faces and outline them.
pub struct FaceBoxTask<D> {
    detector: D,
}

impl<D: FaceDetector> FaceBoxTask<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Draw unfilled outlines onto a BGR image in place.
    pub fn draw_faces(bgr: &mut Mat, faces: &[Rect]) -> Result<()> {
        let [b, g, r] = BOX_COLOR;
        let color = Scalar::new(b, g, r, 0.0);
        for face in faces {
            imgproc::rectangle(bgr, *face, color, BOX_THICKNESS, imgproc::LINE_8, 0)?;
        }
        Ok(())
    }
}

impl<D: FaceDetector> FrameTask for FaceBoxTask<D> {
    fn name(&self) -> &'static str {
        "facedetect"
    }

    fn apply(&mut self, frame: &FrameView<'_>, _param: i32) -> Result<Mat> {
        let mut bgr = frame.to_color(ColorOrder::Bgr)?;
        let faces = self.detector.detect(&bgr)?;
        trace!("{} face(s): {:?}", faces.len(), faces);
        Self::draw_faces(&mut bgr, &faces)?;
        Ok(to_rgba(&bgr, ColorOrder::Bgr)?)
    }
}

/// Shift every channel by `param - 100`, saturating.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrightnessTask;

impl FrameTask for BrightnessTask {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn apply(&mut self, frame: &FrameView<'_>, param: i32) -> Result<Mat> {
        let rgb = frame.to_color(ColorOrder::Rgb)?;
        let adjusted = adjust_brightness(&rgb, brightness_delta(param))?;
        Ok(to_rgba(&adjusted, ColorOrder::Rgb)?)
    }
}
