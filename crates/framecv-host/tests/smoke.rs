use framecv_detect::FaceDetector;
use framecv_host::{ffi, BrightnessTask, FaceBoxTask, FrameProcessor};
use framecv_surface::{DisplaySurface, MemorySurface, SCREEN_HEIGHT, SCREEN_WIDTH};
use opencv::core::{Mat, Rect};
use std::{cell::RefCell, rc::Rc};

/// MemorySurface the test can still read after handing it to the host.
#[derive(Clone, Default)]
struct Shared(Rc<RefCell<MemorySurface>>);

impl DisplaySurface for Shared {
    fn size(&self) -> (u32, u32) {
        self.0.borrow().size()
    }

    fn present(&mut self, rgba: &[u8]) -> framecv_surface::Result<()> {
        self.0.borrow_mut().present(rgba)
    }
}

struct OneFace;

impl FaceDetector for OneFace {
    fn detect(&mut self, bgr: &Mat) -> framecv_detect::Result<Vec<Rect>> {
        use opencv::prelude::*;
        assert_eq!((bgr.cols(), bgr.rows()), (640, 480));
        Ok(vec![Rect::new(64, 96, 256, 192)])
    }
}

fn canvas(rgb: [u8; 3]) -> Vec<u8> {
    (0..SCREEN_WIDTH * SCREEN_HEIGHT)
        .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
        .collect()
}

fn px(rgba: &[u8], x: u32, y: u32) -> &[u8] {
    let i = ((y * SCREEN_WIDTH + x) * 4) as usize;
    &rgba[i..i + 4]
}

#[test]
fn brightness_through_exported_call() {
    let surface = Shared::default();
    ffi::install(FrameProcessor::new(surface.clone(), BrightnessTask));

    let frame = canvas([10, 120, 250]);
    unsafe { ffi::doOpenCvTask(frame.as_ptr() as usize, 640, 480, 120) };

    let screen = surface.0.borrow();
    assert_eq!(screen.flips(), 1);
    assert_eq!(px(screen.pixels(), 0, 0), &[30, 140, 255, 255]);
    assert_eq!(px(screen.pixels(), 639, 479), &[30, 140, 255, 255]);
    drop(screen);
    ffi::uninstall();
}

#[test]
fn face_boxes_through_exported_call() {
    let surface = Shared::default();
    ffi::install(FrameProcessor::new(surface.clone(), FaceBoxTask::new(OneFace)));

    let frame = canvas([255, 255, 255]);
    unsafe { ffi::doOpenCvTaskWithLen(frame.as_ptr() as usize, frame.len(), 640, 480, 0) };

    let screen = surface.0.borrow();
    assert_eq!(screen.flips(), 1);
    assert_eq!(px(screen.pixels(), 64, 96), &[205, 105, 0, 255]);
    assert_eq!(px(screen.pixels(), 192, 192), &[255, 255, 255, 255]);
    assert_eq!(px(screen.pixels(), 0, 0), &[255, 255, 255, 255]);
    drop(screen);
    ffi::uninstall();
}

#[test]
fn mismatched_frame_leaves_screen_alone() {
    let surface = Shared::default();
    ffi::install(FrameProcessor::new(surface.clone(), BrightnessTask));

    let small = vec![255u8; 320 * 240 * 4];
    unsafe { ffi::doOpenCvTask(small.as_ptr() as usize, 320, 240, 100) };

    let screen = surface.0.borrow();
    assert_eq!(screen.flips(), 0);
    assert!(screen.pixels().iter().all(|&b| b == 0));
    drop(screen);
    ffi::uninstall();
}
