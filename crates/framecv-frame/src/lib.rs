//! framecv‑frame – borrowed RGBA frames and the OpenCV colour plumbing
//! around them.
//!
//! A [`FrameView`] is a checked window onto caller-owned RGBA memory.  It is
//! only ever wrapped as a `Mat` header for the length of one conversion, so
//! nothing downstream can hold on to the caller's buffer.

use std::ffi::c_void;

use opencv::{
    core::{Mat, Mat_AUTO_STEP, CV_8UC4},
    imgproc,
    prelude::*,
};
use thiserror::Error;

pub const RGBA_CHANNELS: usize = 4;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("Frame {width}x{height} needs {expected} bytes, buffer has {got}")]
    LengthMismatch { width: u32, height: u32, expected: usize, got: usize },
    #[error("Frame {width}x{height} is too large to address")]
    TooLarge { width: u32, height: u32 },
    #[error("Null frame address")]
    NullAddress,
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Channel order of a 3-channel image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    /// OpenCV's native order; what the face detector expects.
    Bgr,
    Rgb,
}

impl ColorOrder {
    fn rgba_to_code(self) -> i32 {
        match self {
            ColorOrder::Bgr => imgproc::COLOR_RGBA2BGR,
            ColorOrder::Rgb => imgproc::COLOR_RGBA2RGB,
        }
    }

    fn to_rgba_code(self) -> i32 {
        match self {
            ColorOrder::Bgr => imgproc::COLOR_BGR2RGBA,
            ColorOrder::Rgb => imgproc::COLOR_RGB2RGBA,
        }
    }
}

/// Expected byte length of a `width × height` RGBA frame.
pub fn rgba_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(RGBA_CHANNELS))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(FrameError::TooLarge { width, height })
}

fn check_shape(len: usize, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FrameError::EmptyFrame { width, height });
    }
    // OpenCV addresses rows and columns as i32
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(FrameError::TooLarge { width, height });
    }
    let expected = rgba_len(width, height)?;
    if len != expected {
        return Err(FrameError::LengthMismatch { width, height, expected, got: len });
    }
    Ok(())
}

/// Caller-owned RGBA pixels, valid for the lifetime `'a` only.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameView<'a> {
    /// Wrap `data` as a `width × height` RGBA frame.  The length must match
    /// exactly.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        check_shape(data.len(), width, height)?;
        Ok(Self { data, width, height })
    }

    /// Wrap a raw address handed over by a host.  Dimensions and `len` are
    /// checked before any memory is touched.
    ///
    /// # Safety
    /// `addr` must point to at least `len` readable bytes that stay valid and
    /// unmodified for `'a`.
    pub unsafe fn from_raw(addr: usize, len: usize, width: u32, height: u32) -> Result<Self> {
        if addr == 0 {
            return Err(FrameError::NullAddress);
        }
        check_shape(len, width, height)?;
        let data = std::slice::from_raw_parts(addr as *const u8, len);
        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Run `f` on a `CV_8UC4` header over the caller's memory.  The header
    /// does not outlive the call.
    fn with_mat<R>(&self, f: impl FnOnce(&Mat) -> opencv::Result<R>) -> Result<R> {
        // SAFETY: length was checked in `new`, the header is only read through
        // and is dropped before `self.data`'s borrow ends.
        let mat = unsafe {
            Mat::new_rows_cols_with_data_unsafe(
                self.height as i32,
                self.width as i32,
                CV_8UC4,
                self.data.as_ptr() as *mut c_void,
                Mat_AUTO_STEP,
            )?
        };
        Ok(f(&mat)?)
    }

    /// Drop alpha and reorder into an owned 3-channel image.
    pub fn to_color(&self, order: ColorOrder) -> Result<Mat> {
        self.with_mat(|rgba| {
            let mut out = Mat::default();
            imgproc::cvt_color_def(rgba, &mut out, order.rgba_to_code())?;
            Ok(out)
        })
    }
}

/// 3-channel image back to RGBA; alpha comes out as 255.
pub fn to_rgba(image: &Mat, order: ColorOrder) -> Result<Mat> {
    let mut out = Mat::default();
    imgproc::cvt_color_def(image, &mut out, order.to_rgba_code())?;
    Ok(out)
}

/// Brightness offset for a host parameter: 100 is neutral.
pub fn brightness_delta(level: i32) -> f64 {
    f64::from(level) - 100.0
}

/// Add `delta` to every channel, saturating to `[0, 255]`.
pub fn adjust_brightness(image: &Mat, delta: f64) -> Result<Mat> {
    let mut out = Mat::default();
    image.convert_to(&mut out, -1, 1.0, delta)?;
    Ok(out)
}

/// Contiguous bytes of an image produced by the helpers above.
pub fn mat_bytes(image: &Mat) -> Result<&[u8]> {
    Ok(image.data_bytes()?)
}
