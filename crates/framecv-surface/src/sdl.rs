// framecv-surface/src/sdl.rs
use crate::{check_len, DisplaySurface, Result, SurfaceError, BYTES_PER_PIXEL, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::debug;
use sdl2::{event::Event, pixels::PixelFormatEnum, surface::Surface, video::Window, EventPump, Sdl};

// Packed 32-bit format whose in-memory byte order is R,G,B,A.
#[cfg(target_endian = "little")]
const STAGING_FORMAT: PixelFormatEnum = PixelFormatEnum::ABGR8888;
#[cfg(target_endian = "big")]
const STAGING_FORMAT: PixelFormatEnum = PixelFormatEnum::RGBA8888;

/// SDL2 window plus an RGBA staging surface of the same size.
pub struct SdlDisplay {
    _sdl: Sdl,
    window: Window,
    event_pump: EventPump,
    staging: Surface<'static>,
    open: bool,
}

impl SdlDisplay {
    /// Bring up SDL video and a 640×480 window.  Call once per process.
    pub fn init(title: &str) -> Result<Self> {
        let sdl = sdl2::init().map_err(SurfaceError::Init)?;
        let video = sdl.video().map_err(SurfaceError::Init)?;
        let window = video
            .window(title, SCREEN_WIDTH, SCREEN_HEIGHT)
            .position_centered()
            .build()
            .map_err(|e| SurfaceError::Window(e.to_string()))?;
        let event_pump = sdl.event_pump().map_err(SurfaceError::Init)?;
        let staging = Surface::new(SCREEN_WIDTH, SCREEN_HEIGHT, STAGING_FORMAT)
            .map_err(SurfaceError::Sdl)?;

        debug!(
            "SDL display ready: {}x{} staging pitch {} (must lock: {})",
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            staging.pitch(),
            staging.must_lock()
        );

        Ok(Self { _sdl: sdl, window, event_pump, staging, open: true })
    }
}

impl DisplaySurface for SdlDisplay {
    fn size(&self) -> (u32, u32) {
        (SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn present(&mut self, rgba: &[u8]) -> Result<()> {
        check_len(self.frame_len(), rgba)?;

        let pitch = self.staging.pitch() as usize;
        let row = SCREEN_WIDTH as usize * BYTES_PER_PIXEL;

        // with_lock_mut pairs SDL_LockSurface / SDL_UnlockSurface around the closure
        self.staging.with_lock_mut(|pixels: &mut [u8]| {
            for (dst, src) in pixels.chunks_mut(pitch).zip(rgba.chunks_exact(row)) {
                dst[..row].copy_from_slice(src);
            }
        });

        let mut screen = self
            .window
            .surface(&self.event_pump)
            .map_err(SurfaceError::Sdl)?;
        self.staging
            .blit(None, &mut screen, None)
            .map_err(SurfaceError::Sdl)?;
        screen.update_window().map_err(SurfaceError::Sdl)
    }

    fn is_open(&mut self) -> bool {
        for event in self.event_pump.poll_iter() {
            if let Event::Quit { .. } = event {
                debug!("SDL quit requested");
                self.open = false;
            }
        }
        self.open
    }
}
