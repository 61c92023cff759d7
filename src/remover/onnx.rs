use std::path::Path;

use image::{DynamicImage, GrayImage, RgbaImage, imageops, imageops::FilterType};
use ndarray::prelude::*;
use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use parking_lot::Mutex;

use super::{BackgroundRemover, RemovalError};

// Fallback when the model declares a dynamic spatial dimension.
// ISNet variants are exported at 1024x1024.
const DEFAULT_IMAGE_SIZE: i64 = 1024;

// ISNet normalization: pixels scaled to [0, 1], then mean 0.5 / std 1.0.
const NORM_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
const NORM_STD: [f32; 3] = [1.0, 1.0, 1.0];

/// Process-wide model session backed by ONNX Runtime.
///
/// Created once at startup and shared by every request handler. The ort
/// session requires `&mut self` to run, so inference is serialized behind a
/// mutex; the handle itself is immutable and never recreated per request.
pub struct OnnxRemover {
    image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl OnnxRemover {
    /// Loads the segmentation model from `model_path` and runs one warm-up
    /// inference so the first request does not pay graph-initialization cost.
    pub fn load(model_path: &Path) -> Result<Self, RemovalError> {
        let mut session = SessionBuilder::new()
            .map_err(RemovalError::SessionInit)?
            .with_memory_pattern(true)
            .map_err(RemovalError::SessionInit)?
            .commit_from_file(model_path)
            .map_err(RemovalError::SessionInit)?;

        let image_size = session.inputs[0]
            .input_type
            .tensor_shape()
            .map(|shape| shape[2])
            .filter(|&dim| dim > 0)
            .unwrap_or(DEFAULT_IMAGE_SIZE) as u32;
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();

        let zeros = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        let warmup =
            TensorRef::from_array_view(&zeros).map_err(RemovalError::SessionInit)?;
        session
            .run(ort::inputs![input_name.as_str() => warmup])
            .map_err(RemovalError::SessionInit)?;

        Ok(Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>, RemovalError> {
        let mut session = self.session.lock();
        let outputs = session.run(
            ort::inputs![self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?],
        )?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl BackgroundRemover for OnnxRemover {
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, RemovalError> {
        let tensor = image_to_tensor(image, self.image_size);
        let mask = self.predict(tensor.view())?;
        let alpha = mask_to_alpha(mask.slice(s![0, 0, .., ..]), image.width(), image.height());
        Ok(apply_alpha(image, &alpha))
    }
}

/// Resizes to the model's square input resolution and lays the pixels out as
/// a normalized NCHW f32 tensor.
fn image_to_tensor(image: &DynamicImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(&image.to_rgb8(), size, size, FilterType::Lanczos3);
    let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (f32::from(pixel[c]) / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
        }
    }
    tensor
}

/// Min-max normalizes the raw mask and resizes it back to the source
/// dimensions as an 8-bit alpha plane.
fn mask_to_alpha(mask: ArrayView2<'_, f32>, width: u32, height: u32) -> GrayImage {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in mask.iter() {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let range = if hi > lo { hi - lo } else { 1.0 };

    let mut alpha = GrayImage::new(mask.ncols() as u32, mask.nrows() as u32);
    for (x, y, pixel) in alpha.enumerate_pixels_mut() {
        let v = (mask[[y as usize, x as usize]] - lo) / range;
        pixel.0[0] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    imageops::resize(&alpha, width, height, FilterType::Lanczos3)
}

/// Writes the mask into the source image's alpha channel. The mask must have
/// the source dimensions; `mask_to_alpha` guarantees that.
fn apply_alpha(image: &DynamicImage, alpha: &GrayImage) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    for (pixel, mask) in rgba.pixels_mut().zip(alpha.pixels()) {
        pixel.0[3] = mask.0[0];
    }
    rgba
}
