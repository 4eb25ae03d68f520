// framecv-surface/src/lib.rs
// ============================================================
// Display surface for framecv
// One fixed 640×480 RGBA target, created once at start-up and
// flipped once per processed frame.
// ------------------------------------------------------------
// Public API:
//   * DisplaySurface            – trait: size / present / is_open
//   * SdlDisplay::init(title)   – SDL2 window + staging surface
//   * MemorySurface::new()      – off-screen target (headless, tests)
// ============================================================

//! framecv – surface layer
//!
//! Processed frames end up here.  [`SdlDisplay`] owns an SDL2 window and a
//! 32-bit RGBA staging surface; every [`DisplaySurface::present`] locks the
//! staging surface, copies the frame in row by row, unlocks it and blits it
//! to the window.  [`MemorySurface`] honours the same contract without a
//! window so the rest of the pipeline can run headless.

use thiserror::Error;

mod sdl;
pub use sdl::SdlDisplay;

/// Fixed surface width in pixels.
pub const SCREEN_WIDTH: u32 = 640;
/// Fixed surface height in pixels.
pub const SCREEN_HEIGHT: u32 = 480;
/// RGBA, one byte per channel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("SDL init failed: {0}")]
    Init(String),
    #[error("Failed to build window: {0}")]
    Window(String),
    #[error("SDL call failed: {0}")]
    Sdl(String),
    #[error("Frame is {got} bytes, surface expects {expected}")]
    SizeMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, SurfaceError>;

/// A display target that takes whole RGBA frames.
pub trait DisplaySurface {
    /// `(width, height)` in pixels; never changes.
    fn size(&self) -> (u32, u32);

    /// Copy a full RGBA frame into the surface and flip it to the screen.
    fn present(&mut self, rgba: &[u8]) -> Result<()>;

    /// `false` once the user asked to close the output.
    fn is_open(&mut self) -> bool {
        true
    }

    /// Byte length a frame passed to [`present`](Self::present) must have.
    fn frame_len(&self) -> usize {
        let (w, h) = self.size();
        w as usize * h as usize * BYTES_PER_PIXEL
    }
}

pub(crate) fn check_len(expected: usize, rgba: &[u8]) -> Result<()> {
    if rgba.len() != expected {
        return Err(SurfaceError::SizeMismatch { expected, got: rgba.len() });
    }
    Ok(())
}

/// Off-screen surface.  Keeps the last presented frame and a flip counter.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    flips: u64,
}

impl MemorySurface {
    /// Black 640×480 surface.
    pub fn new() -> Self {
        Self::with_size(SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
            flips: 0,
        }
    }

    /// Pixels of the last presented frame.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of successful presents so far.
    pub fn flips(&self) -> u64 {
        self.flips
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySurface for MemorySurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, rgba: &[u8]) -> Result<()> {
        check_len(self.pixels.len(), rgba)?;
        self.pixels.copy_from_slice(rgba);
        self.flips += 1;
        Ok(())
    }
}
