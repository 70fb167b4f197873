// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns an iteration field into pixels.  Counts are normalized with a
//! square-root curve, which spreads the low counts near the set out
//! over more of the palette, and then looked up in a palette.

use image::{ImageBuffer, Rgb, RgbImage};
use num::clamp;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{MandelError, Result};
use crate::escape::IterationField;

/// `sqrt(count / max_iter)` for every count, row-major.  Always in
/// `[0, 1]`; points that never escaped map to 1.
pub fn normalize(field: &IterationField) -> Vec<f64> {
    let max_iter = f64::from(field.max_iter());
    field
        .counts()
        .iter()
        .map(|&n| clamp((f64::from(n) / max_iter).sqrt(), 0.0, 1.0))
        .collect()
}

/// Coefficients of the fifth-degree polynomial fit to the turbo
/// colormap, lowest order first, one row per channel.
const TURBO: [[f64; 6]; 3] = [
    [0.13572138, 4.61539260, -42.66032258, 132.13108234, -152.94239396, 59.28637943],
    [0.09140261, 2.19418839, 4.84296658, -14.18503333, 4.27729857, 2.82956604],
    [0.10667330, 12.64194608, -60.58204836, 110.36276771, -89.90310912, 27.34824973],
];

fn horner(coefficients: &[f64; 6], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &k| acc * t + k)
}

fn channel(v: f64) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0).round() as u8
}

/// A sequential color map from `[0, 1]` to RGB.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Palette {
    /// Dark blue through green and yellow to dark red.
    Turbo,
    /// Black to white.
    Grayscale,
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Turbo
    }
}

impl Palette {
    /// The color for `t`, which is clamped to `[0, 1]` first.
    pub fn color(self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.0 } else { clamp(t, 0.0, 1.0) };
        match self {
            Palette::Turbo => Rgb([
                channel(horner(&TURBO[0], t)),
                channel(horner(&TURBO[1], t)),
                channel(horner(&TURBO[2], t)),
            ]),
            Palette::Grayscale => {
                let v = channel(t);
                Rgb([v, v, v])
            }
        }
    }
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turbo" => Ok(Palette::Turbo),
            "gray" | "grey" | "grayscale" => Ok(Palette::Grayscale),
            other => Err(format!("unknown palette '{}' (expected turbo or gray)", other)),
        }
    }
}

/// Builds the image for `field`.  Row 0 of the field (the lowest
/// imaginary part) is drawn along the bottom edge, so the picture is
/// oriented like the complex plane with the imaginary axis pointing up.
pub fn to_image(field: &IterationField, palette: Palette) -> RgbImage {
    let levels = normalize(field);
    let (width, height) = (field.width(), field.height());
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let row = height - 1 - (y as usize);
        palette.color(levels[row * width + (x as usize)])
    })
}

/// Saves `image` to `path`.  The format follows the file extension.
pub fn write_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing image");
    image.save(path).map_err(|e| MandelError::ImageWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
