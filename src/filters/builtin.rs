use image::{DynamicImage, Rgba};
use serde::Deserialize;

use super::{Filter, FilterError};

const MAX_SIGMA: f32 = 100.0;
/// Above the largest gradient magnitude a Sobel pass can produce.
const MAX_EDGE_THRESHOLD: f32 = 2000.0;

/// A single built-in image operation. Description documents are lists of
/// these, and every registered preset is built from them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Identity,
    Grayscale,
    Invert,
    Sepia,
    Blur {
        sigma: f32,
    },
    Sharpen {
        sigma: f32,
        #[serde(default)]
        threshold: i32,
    },
    Brighten {
        amount: i32,
    },
    Contrast {
        amount: f32,
    },
    HueRotate {
        degrees: i32,
    },
    Edges {
        low: f32,
        high: f32,
    },
    FlipHorizontal,
    FlipVertical,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Operation {
    pub fn op_name(&self) -> &'static str {
        match self {
            Operation::Identity => "identity",
            Operation::Grayscale => "grayscale",
            Operation::Invert => "invert",
            Operation::Sepia => "sepia",
            Operation::Blur { .. } => "blur",
            Operation::Sharpen { .. } => "sharpen",
            Operation::Brighten { .. } => "brighten",
            Operation::Contrast { .. } => "contrast",
            Operation::HueRotate { .. } => "hue_rotate",
            Operation::Edges { .. } => "edges",
            Operation::FlipHorizontal => "flip_horizontal",
            Operation::FlipVertical => "flip_vertical",
            Operation::Rotate90 => "rotate90",
            Operation::Rotate180 => "rotate180",
            Operation::Rotate270 => "rotate270",
        }
    }

    /// Reject parameters the underlying image operations cannot handle.
    pub fn validate(&self) -> Result<(), FilterError> {
        let invalid = |reason: &str| FilterError::InvalidParameter {
            filter: self.op_name(),
            reason: reason.to_string(),
        };

        match *self {
            Operation::Blur { sigma } | Operation::Sharpen { sigma, .. } => {
                // The gaussian kernel rejects subnormal sigmas and grows with sigma.
                if !sigma.is_normal() || sigma <= 0.0 || sigma > MAX_SIGMA {
                    return Err(invalid("sigma must be a positive number up to 100"));
                }
            }
            Operation::Contrast { amount } => {
                if !amount.is_finite() {
                    return Err(invalid("amount must be finite"));
                }
            }
            Operation::Edges { low, high } => {
                if !low.is_finite()
                    || !high.is_finite()
                    || low < 0.0
                    || low > high
                    || high > MAX_EDGE_THRESHOLD
                {
                    return Err(invalid("thresholds must satisfy 0 <= low <= high <= 2000"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn run(&self, image: DynamicImage) -> DynamicImage {
        match *self {
            Operation::Identity => image,
            Operation::Grayscale => image.grayscale(),
            Operation::Invert => {
                let mut image = image;
                image.invert();
                image
            }
            Operation::Sepia => sepia(&image),
            Operation::Blur { sigma } => image.blur(sigma),
            Operation::Sharpen { sigma, threshold } => image.unsharpen(sigma, threshold),
            Operation::Brighten { amount } => image.brighten(amount),
            Operation::Contrast { amount } => image.adjust_contrast(amount),
            Operation::HueRotate { degrees } => image.huerotate(degrees),
            Operation::Edges { low, high } => {
                DynamicImage::ImageLuma8(imageproc::edges::canny(&image.to_luma8(), low, high))
            }
            Operation::FlipHorizontal => image.fliph(),
            Operation::FlipVertical => image.flipv(),
            Operation::Rotate90 => image.rotate90(),
            Operation::Rotate180 => image.rotate180(),
            Operation::Rotate270 => image.rotate270(),
        }
    }
}

impl Filter for Operation {
    fn name(&self) -> &str {
        self.op_name()
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        self.run(image)
    }
}

/// Ordered composition of operations, applied first to last.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    steps: Vec<Operation>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, steps: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

impl Filter for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        self.steps.iter().fold(image, |image, step| step.run(image))
    }
}

fn sepia(image: &DynamicImage) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let tone = |rw: f32, gw: f32, bw: f32| (r * rw + g * gw + b * bw).min(255.0) as u8;
        *pixel = Rgba([
            tone(0.393, 0.769, 0.189),
            tone(0.349, 0.686, 0.168),
            tone(0.272, 0.534, 0.131),
            a,
        ]);
    }
    DynamicImage::ImageRgba8(rgba)
}
