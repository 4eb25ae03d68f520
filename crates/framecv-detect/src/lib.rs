// framecv-detect/src/lib.rs
// ============================================================
// framecv-detect  –  Face-detection stage
// Runs the res10 300×300 SSD Caffe model through the OpenCV
// DNN module.
// ------------------------------------------------------------
// Pipeline: BGR Mat → blob → forward → Vec<Rect>
// ------------------------------------------------------------
// Public API
//   * FaceNet::load(&config)      – read prototxt + caffemodel
//   * FaceDetector::detect(&mat)  – face rectangles in pixels
//   * extract_faces(rows, w, h)   – threshold + scale-back only
// ============================================================

//! framecv – detection layer
//!
//! [`FaceDetector`] is the seam the frame processor talks to;
//! [`FaceNet`] is the OpenCV-backed implementation.  The network reports
//! one row per candidate: `[image_id, label, confidence, left, top, right,
//! bottom]`, box corners normalised to `[0, 1]`.  [`extract_faces`] turns
//! those rows into pixel rectangles of the *original* frame.

use log::debug;
use ndarray::ArrayView2;
use opencv::{
    core::{Mat, Rect, Scalar, Size, CV_32F},
    dnn,
    prelude::*,
};
use thiserror::Error;

pub mod config;
pub use config::DetectorConfig;

/// Fields per row of the `detection_out` blob.
pub const DETECTION_FIELDS: usize = 7;
/// Working resolution (width, height) the network was trained on.
pub const INPUT_SIZE: (i32, i32) = (300, 300);
/// Pixel multiplier applied before mean subtraction.
pub const SCALE_FACTOR: f64 = 1.0;
/// Caffe channel means, BGR.
pub const MEAN: [f64; 3] = [104.0, 177.0, 123.0];
/// Rows scoring below this are dropped.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

const INPUT_LAYER: &str = "data";
const OUTPUT_LAYER: &str = "detection_out";

const CONFIDENCE: usize = 2;
const LEFT: usize = 3;
const TOP: usize = 4;
const RIGHT: usize = 5;
const BOTTOM: usize = 6;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model file not found: {0}")]
    ModelMissing(std::path::PathBuf),
    #[error("Failed to load network with the following settings:\nConfiguration: {prototxt}\nBinary: {weights}")]
    EmptyNetwork { prototxt: String, weights: String },
    #[error("Invalid detector configuration: {0}")]
    Config(String),
    #[error("Detection output has {0} fields per row, expected at least 7")]
    MalformedOutput(usize),
    #[error("Detection output has shape {0:?}, expected [1, 1, N, 7]")]
    OutputDims(Vec<i32>),
    #[error("Detection output shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;

/// Anything that maps a BGR image to face rectangles.
pub trait FaceDetector {
    fn detect(&mut self, bgr: &Mat) -> Result<Vec<Rect>>;
}

/// Keep rows scoring at least `threshold` and scale their normalised corners
/// to a `cols × rows` image.  Output order follows row order.
pub fn extract_faces(detections: ArrayView2<'_, f32>, cols: i32, rows: i32, threshold: f32) -> Result<Vec<Rect>> {
    if detections.ncols() < DETECTION_FIELDS {
        return Err(DetectError::MalformedOutput(detections.ncols()));
    }
    let (w, h) = (cols as f32, rows as f32);

    let faces = detections
        .rows()
        .into_iter()
        .filter(|row| row[CONFIDENCE] >= threshold)
        .map(|row| {
            let left = (row[LEFT] * w) as i32;
            let top = (row[TOP] * h) as i32;
            let right = (row[RIGHT] * w) as i32;
            let bottom = (row[BOTTOM] * h) as i32;
            Rect::new(left, top, right - left, bottom - top)
        })
        .collect();
    Ok(faces)
}

/// View the `[1, 1, N, F]` output blob as an `N × F` matrix.  Rows narrower
/// than [`DETECTION_FIELDS`] are rejected.
pub fn detection_matrix(output: &Mat) -> Result<ArrayView2<'_, f32>> {
    let size = output.mat_size();
    let dims: &[i32] = &size;
    if dims.len() != 4 || dims[2] < 0 || dims[3] < 0 {
        return Err(DetectError::OutputDims(dims.to_vec()));
    }
    let (n, fields) = (dims[2] as usize, dims[3] as usize);
    if fields < DETECTION_FIELDS {
        return Err(DetectError::MalformedOutput(fields));
    }
    let values = output.data_typed::<f32>()?;
    Ok(ArrayView2::from_shape((n, fields), values)?)
}

/// OpenCV DNN face detector.  The network is immutable once loaded.
pub struct FaceNet {
    net: dnn::Net,
    config: DetectorConfig,
}

impl FaceNet {
    /// Load topology and weights.  Fails if either file is missing or the
    /// resulting network is empty.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        for path in [&config.prototxt, &config.weights] {
            if !path.is_file() {
                return Err(DetectError::ModelMissing(path.clone()));
            }
        }
        let prototxt = config.prototxt.to_string_lossy().into_owned();
        let weights = config.weights.to_string_lossy().into_owned();

        let net = dnn::read_net_from_caffe(&prototxt, &weights)?;
        if net.empty()? {
            return Err(DetectError::EmptyNetwork { prototxt, weights });
        }

        debug!("face network loaded from {} + {}", prototxt, weights);
        Ok(Self { net, config: config.clone() })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl FaceDetector for FaceNet {
    fn detect(&mut self, bgr: &Mat) -> Result<Vec<Rect>> {
        let (in_w, in_h) = INPUT_SIZE;
        let [b, g, r] = MEAN;

        let blob = dnn::blob_from_image(
            bgr,
            SCALE_FACTOR,
            Size::new(in_w, in_h),
            Scalar::new(b, g, r, 0.0),
            false,
            false,
            CV_32F,
        )?;
        self.net.set_input(&blob, INPUT_LAYER, 1.0, Scalar::default())?;
        let output = self.net.forward_single(OUTPUT_LAYER)?;

        let matrix = detection_matrix(&output)?;
        let faces = extract_faces(matrix, bgr.cols(), bgr.rows(), CONFIDENCE_THRESHOLD)?;
        debug!("{} candidates, {} faces", matrix.nrows(), faces.len());
        Ok(faces)
    }
}
