//! Native stand-in for the browser host: reads frames with OpenCV, hands
//! them over as RGBA canvases through the exported `doOpenCvTask`.

use anyhow::{bail, Context, Result};
use clap::Args;
use framecv_host::{ffi, FrameProcessor, FrameTask};
use framecv_surface::{MemorySurface, SdlDisplay, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{info, warn};
use opencv::{
    core::{Mat, Size},
    imgcodecs, imgproc,
    prelude::*,
    videoio,
};
use std::{collections::VecDeque, path::Path, time::Instant};

const FPS_WINDOW_SIZE: usize = 30;
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "webp", "tiff"];

/// Options shared by both demos.
#[derive(Args, Debug)]
pub struct HarnessArgs {
    /// Camera index, video file or still image
    #[arg(long, default_value = "0")]
    pub source: String,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Render off-screen instead of opening a window
    #[arg(long)]
    pub headless: bool,
}

/// Where frames come from.
enum FrameSource {
    Capture(videoio::VideoCapture),
    Still(Mat),
}

impl FrameSource {
    fn open(spec: &str) -> Result<Self> {
        if let Ok(index) = spec.parse::<i32>() {
            let cap = videoio::VideoCapture::new(index, videoio::CAP_ANY)
                .with_context(|| format!("opening camera {index}"))?;
            return Self::checked(cap, spec);
        }

        let is_image = Path::new(spec)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            let image = imgcodecs::imread(spec, imgcodecs::IMREAD_COLOR)
                .with_context(|| format!("reading {spec}"))?;
            if image.empty() {
                bail!("could not decode {spec}");
            }
            return Ok(FrameSource::Still(image));
        }

        let cap = videoio::VideoCapture::from_file(spec, videoio::CAP_ANY)
            .with_context(|| format!("opening video {spec}"))?;
        Self::checked(cap, spec)
    }

    fn checked(cap: videoio::VideoCapture, spec: &str) -> Result<Self> {
        if !cap.is_opened()? {
            bail!("frame source {spec} did not open");
        }
        Ok(FrameSource::Capture(cap))
    }

    /// Next BGR frame, `None` at end of stream.
    fn next_bgr(&mut self) -> Result<Option<Mat>> {
        match self {
            FrameSource::Capture(cap) => {
                let mut frame = Mat::default();
                if !cap.read(&mut frame)? || frame.empty() {
                    return Ok(None);
                }
                Ok(Some(frame))
            }
            FrameSource::Still(image) => Ok(Some(image.try_clone()?)),
        }
    }
}

/// BGR camera frame → 640×480 RGBA bytes, the shape a canvas hands over.
fn to_canvas(bgr: &Mat) -> Result<Vec<u8>> {
    let mut resized = Mat::default();
    imgproc::resize(
        bgr,
        &mut resized,
        Size::new(SCREEN_WIDTH as i32, SCREEN_HEIGHT as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    let mut rgba = Mat::default();
    imgproc::cvt_color_def(&resized, &mut rgba, imgproc::COLOR_BGR2RGBA)?;
    Ok(rgba.data_bytes()?.to_vec())
}

fn calculate_fps(window: &VecDeque<Instant>) -> f64 {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) if window.len() >= 2 => {
            (window.len() - 1) as f64 / last.duration_since(*first).as_secs_f64()
        }
        _ => 0.0,
    }
}

/// Install `task` behind the exported entry point and feed it frames until
/// the source ends, the frame limit is hit or the window is closed.
pub fn run(args: &HarnessArgs, title: &str, task: impl FrameTask + 'static, param: i32) -> Result<()> {
    if args.headless {
        ffi::install(FrameProcessor::new(MemorySurface::new(), task));
    } else {
        let display = SdlDisplay::init(title).context("initialising display")?;
        ffi::install(FrameProcessor::new(display, task));
    }

    let mut source = FrameSource::open(&args.source)?;
    info!("{title}: reading from {} (param {param})", args.source);

    let mut fps_times: VecDeque<Instant> = VecDeque::with_capacity(FPS_WINDOW_SIZE);
    let mut frame_count = 0u64;

    while args.frames.map_or(true, |limit| frame_count < limit) {
        if !ffi::with_session(|sink| sink.is_open()).unwrap_or(false) {
            info!("output closed");
            break;
        }
        let Some(bgr) = source.next_bgr()? else {
            info!("end of stream");
            break;
        };
        let canvas = to_canvas(&bgr)?;

        // SAFETY: `canvas` is 640×480×4 bytes and outlives the call
        unsafe {
            ffi::doOpenCvTask(canvas.as_ptr() as usize, SCREEN_WIDTH as i32, SCREEN_HEIGHT as i32, param);
        }

        fps_times.push_back(Instant::now());
        if fps_times.len() > FPS_WINDOW_SIZE {
            fps_times.pop_front();
        }
        frame_count += 1;
        if frame_count % 30 == 0 {
            info!("frame {}: {:.1} FPS", frame_count, calculate_fps(&fps_times));
        }
    }

    if ffi::uninstall().is_none() {
        warn!("frame sink vanished before shutdown");
    }
    info!("{title}: {frame_count} frame(s) processed");
    Ok(())
}

/// `env_logger` with `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};
    use std::time::Duration;

    #[test]
    fn fps_needs_two_samples() {
        let mut window = VecDeque::new();
        assert_eq!(calculate_fps(&window), 0.0);
        window.push_back(Instant::now());
        assert_eq!(calculate_fps(&window), 0.0);
    }

    #[test]
    fn fps_from_window() {
        let start = Instant::now();
        let window: VecDeque<Instant> =
            (0..11).map(|i| start + Duration::from_millis(100 * i)).collect();
        let fps = calculate_fps(&window);
        assert!((fps - 10.0).abs() < 1e-6, "fps {fps}");
    }

    #[test]
    fn canvas_is_rgba_at_screen_size() {
        // BGR (255, 0, 0) is blue
        let bgr = Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::new(255.0, 0.0, 0.0, 0.0)).unwrap();
        let canvas = to_canvas(&bgr).unwrap();
        assert_eq!(canvas.len(), 640 * 480 * 4);
        assert_eq!(&canvas[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn still_image_repeats() {
        let image = Mat::new_rows_cols_with_default(2, 2, CV_8UC3, Scalar::all(9.0)).unwrap();
        let mut source = FrameSource::Still(image);
        assert!(source.next_bgr().unwrap().is_some());
        assert!(source.next_bgr().unwrap().is_some());
    }
}
