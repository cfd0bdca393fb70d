//! Color filter chain with the Filter Effects matrices browsers use for
//! `brightness()`, `contrast()`, `saturate()`, `grayscale()`, `sepia()` and
//! `hue-rotate()`.

use image::RgbaImage;

use crate::editor::adjustments::EditorAdjustments;

type Matrix = [[f32; 3]; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
enum FilterStage {
    Brightness(f32),
    Contrast(f32),
    Matrix(Matrix),
}

fn saturate_matrix(amount: f32) -> Matrix {
    let s = amount;
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix {
    let s = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Non-neutral stages in application order.
fn stages(adjustments: &EditorAdjustments) -> Vec<FilterStage> {
    let neutral = EditorAdjustments::NEUTRAL;
    let mut stages = Vec::with_capacity(6);
    if adjustments.brightness() != neutral.brightness() {
        stages.push(FilterStage::Brightness(adjustments.brightness() as f32 / 100.0));
    }
    if adjustments.contrast() != neutral.contrast() {
        stages.push(FilterStage::Contrast(adjustments.contrast() as f32 / 100.0));
    }
    if adjustments.saturate() != neutral.saturate() {
        stages.push(FilterStage::Matrix(saturate_matrix(
            adjustments.saturate() as f32 / 100.0,
        )));
    }
    if adjustments.grayscale() != neutral.grayscale() {
        stages.push(FilterStage::Matrix(grayscale_matrix(
            adjustments.grayscale() as f32 / 100.0,
        )));
    }
    if adjustments.sepia() != neutral.sepia() {
        stages.push(FilterStage::Matrix(sepia_matrix(
            adjustments.sepia() as f32 / 100.0,
        )));
    }
    if adjustments.hue_rotate() != neutral.hue_rotate() {
        stages.push(FilterStage::Matrix(hue_rotate_matrix(
            adjustments.hue_rotate() as f32,
        )));
    }
    stages
}

fn apply_stage(stage: FilterStage, rgb: [f32; 3]) -> [f32; 3] {
    let out = match stage {
        FilterStage::Brightness(amount) => rgb.map(|channel| channel * amount),
        FilterStage::Contrast(amount) => rgb.map(|channel| (channel - 0.5) * amount + 0.5),
        FilterStage::Matrix(m) => [
            m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
            m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
            m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
        ],
    };
    out.map(|channel| channel.clamp(0.0, 1.0))
}

/// Bakes `adjustments` into a copy of `source`; alpha is left untouched.
pub fn apply_filters(source: &RgbaImage, adjustments: &EditorAdjustments) -> RgbaImage {
    let stages = stages(adjustments);
    let mut output = source.clone();
    if stages.is_empty() {
        return output;
    }
    tracing::debug!(stages = stages.len(), "applying filter chain");
    for pixel in output.pixels_mut() {
        let mut rgb = [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
        ];
        for stage in &stages {
            rgb = apply_stage(*stage, rgb);
        }
        for (channel, value) in rgb.into_iter().enumerate() {
            pixel[channel] = (value * 255.0).round() as u8;
        }
    }
    output
}
