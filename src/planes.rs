// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the SampleGrid, which describes a relationship between a
//! rectangle of pixels on the integral plane, with its origin at 0,0,
//! and a rectangle on the complex plane described by a center point
//! and a half-range along the real axis.  Each pixel gets exactly one
//! complex sample; the kernel never sees pixels, only samples.

use itertools::iproduct;
use num::Complex;

use crate::error::{MandelError, Result};

/// Returns `n` evenly spaced samples over the closed interval
/// `[start, stop]`.  The last sample is exactly `stop`.  A single
/// sample sits at the midpoint of the interval, so a one-pixel-high
/// image looks at the center line rather than the bottom edge.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![(start + stop) / 2.0],
        _ => {
            let step = (stop - start) / ((n - 1) as f64);
            let mut samples: Vec<f64> = (0..n).map(|i| start + (i as f64) * step).collect();
            samples[n - 1] = stop;
            samples
        }
    }
}

/// The bounds actually sampled on each axis: the lowest and highest
/// real part, and the lowest and highest imaginary part.  This is the
/// extent a renderer should claim the image covers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    /// Smallest real part in the grid (leftmost column)
    pub re_min: f64,
    /// Largest real part in the grid (rightmost column)
    pub re_max: f64,
    /// Smallest imaginary part in the grid (row 0)
    pub im_min: f64,
    /// Largest imaginary part in the grid (last row)
    pub im_max: f64,
}

/// A height x width grid of complex sample points, stored row-major.
/// The real part varies by column and the imaginary part by row; row
/// 0 holds the lowest imaginary value.  Immutable once built.
#[derive(Clone, Debug)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    points: Vec<Complex<f64>>,
    extent: Extent,
}

fn finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MandelError::NonFinite { name, value })
    }
}

impl SampleGrid {
    /// Builds the grid from two independent axes: `re` supplies one
    /// value per column and `im` one value per row.
    pub fn from_axes(re: &[f64], im: &[f64]) -> Result<SampleGrid> {
        if re.is_empty() || im.is_empty() {
            return Err(MandelError::InvalidDimensions {
                width: re.len(),
                height: im.len(),
            });
        }
        for &v in re.iter().chain(im.iter()) {
            finite("sample coordinate", v)?;
        }

        let points: Vec<Complex<f64>> = iproduct!(im.iter(), re.iter())
            .map(|(&im, &re)| Complex::new(re, im))
            .collect();

        let (re_min, re_max) = bounds(re);
        let (im_min, im_max) = bounds(im);

        Ok(SampleGrid {
            width: re.len(),
            height: im.len(),
            points,
            extent: Extent {
                re_min,
                re_max,
                im_min,
                im_max,
            },
        })
    }

    /// Constructor.  Takes the pixel dimensions, the center of the view
    /// and the half-range of the real axis.  The imaginary half-range
    /// is scaled by height/width so pixels stay square.
    pub fn centered(
        width: usize,
        height: usize,
        center: Complex<f64>,
        axis_range: f64,
    ) -> Result<SampleGrid> {
        if width == 0 || height == 0 {
            return Err(MandelError::InvalidDimensions { width, height });
        }
        finite("x_center", center.re)?;
        finite("y_center", center.im)?;
        finite("axis_range", axis_range)?;
        if axis_range <= 0.0 {
            return Err(MandelError::InvalidRange(axis_range));
        }

        let im_range = axis_range * (height as f64) / (width as f64);
        let re = linspace(center.re - axis_range, center.re + axis_range, width);
        let im = linspace(center.im - im_range, center.im + im_range, height);
        SampleGrid::from_axes(&re, &im)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of samples in the grid.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a grid built by the constructors.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All samples, row-major.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// The samples of row `y`.
    pub fn row(&self, y: usize) -> &[Complex<f64>] {
        &self.points[y * self.width..(y + 1) * self.width]
    }

    /// The sample at column `x`, row `y`.
    pub fn at(&self, x: usize, y: usize) -> Complex<f64> {
        self.points[y * self.width + x]
    }

    /// The sampled bounds.
    pub fn extent(&self) -> Extent {
        self.extent
    }
}

fn bounds(axis: &[f64]) -> (f64, f64) {
    axis.iter()
        .fold((std::f64::INFINITY, std::f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(-2.0, 2.0, 3), vec![-2.0, 0.0, 2.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(-1.0, 3.0, 1), vec![1.0]);
    }

    #[test]
    fn linspace_last_sample_is_exact() {
        let s = linspace(-0.1, 0.7, 13);
        assert_eq!(s.len(), 13);
        assert_eq!(s[12], 0.7);
    }

    #[test]
    fn grid_fails_on_bad_shape() {
        assert!(SampleGrid::centered(0, 4, Complex::new(0.0, 0.0), 1.0).is_err());
        assert!(SampleGrid::centered(4, 0, Complex::new(0.0, 0.0), 1.0).is_err());
    }

    #[test]
    fn grid_fails_on_bad_range() {
        match SampleGrid::centered(4, 4, Complex::new(0.0, 0.0), -1.0) {
            Err(MandelError::InvalidRange(r)) => assert_eq!(r, -1.0),
            other => panic!("expected InvalidRange, got {:?}", other),
        }
        assert!(SampleGrid::centered(4, 4, Complex::new(0.0, 0.0), 0.0).is_err());
    }

    #[test]
    fn grid_fails_on_non_finite_center() {
        let pm = SampleGrid::centered(4, 4, Complex::new(std::f64::NAN, 0.0), 1.0);
        match pm {
            Err(MandelError::NonFinite { name, .. }) => assert_eq!(name, "x_center"),
            other => panic!("expected NonFinite, got {:?}", other),
        }
        assert!(SampleGrid::centered(4, 4, Complex::new(0.0, std::f64::INFINITY), 1.0).is_err());
    }

    #[test]
    fn grid_from_axes_rejects_empty_axes() {
        assert!(SampleGrid::from_axes(&[], &[0.0]).is_err());
        assert!(SampleGrid::from_axes(&[0.0], &[]).is_err());
    }

    #[test]
    fn real_part_varies_by_column_imaginary_by_row() {
        let grid = SampleGrid::from_axes(&[-1.0, 0.0, 1.0], &[-0.5, 0.5]).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.at(0, 0), Complex::new(-1.0, -0.5));
        assert_eq!(grid.at(2, 0), Complex::new(1.0, -0.5));
        assert_eq!(grid.at(1, 1), Complex::new(0.0, 0.5));
        assert_eq!(
            grid.row(1),
            &[
                Complex::new(-1.0, 0.5),
                Complex::new(0.0, 0.5),
                Complex::new(1.0, 0.5)
            ]
        );
    }

    #[test]
    fn centered_grid_keeps_pixels_square() {
        let grid = SampleGrid::centered(8, 4, Complex::new(-0.5, 0.0), 2.0).unwrap();
        let extent = grid.extent();
        assert_eq!(extent.re_min, -2.5);
        assert_eq!(extent.re_max, 1.5);
        assert_eq!(extent.im_min, -1.0);
        assert_eq!(extent.im_max, 1.0);
    }

    #[test]
    fn single_row_grid_samples_the_center_line() {
        let grid = SampleGrid::centered(3, 1, Complex::new(0.0, 0.0), 2.0).unwrap();
        assert_eq!(
            grid.points(),
            &[
                Complex::new(-2.0, 0.0),
                Complex::new(0.0, 0.0),
                Complex::new(2.0, 0.0)
            ]
        );
    }
}
