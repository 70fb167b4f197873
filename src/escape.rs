// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.
//!
//! Every sample `c` in the grid is iterated under `z <- z*z + c`,
//! starting from zero, until either the orbit leaves the circle of
//! radius 2 or the iteration bound is reached.  The number recorded is
//! the count of completed iterations when the loop stops.  No sample
//! looks at any other sample, so rows can be handed to as many threads
//! as are available; the result is bit-identical to sweeping the grid
//! on a single thread.

use num::Complex;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{MandelError, Result};
use crate::planes::SampleGrid;

/// Iterates a single sample.  The loop continues while the squared
/// magnitude is at most 4.0 and fewer than `max_iter` iterations have
/// run; the return value is the number of iterations completed.  A
/// result of `max_iter` means the orbit had not escaped by then.
///
/// Comparing the squared magnitude against 4.0 saves a square root per
/// step; it is equivalent to testing `|z| > 2`.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iter: u32) -> u32 {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut count = 0;
    while z.norm_sqr() <= 4.0 && count < max_iter {
        z = z * z + c;
        count += 1;
    }
    count
}

/// The escape counts for every sample of a grid, row-major, the same
/// shape as the grid it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationField {
    width: usize,
    height: usize,
    max_iter: u32,
    counts: Vec<u32>,
}

impl IterationField {
    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The bound the field was computed with.  Every count is at most
    /// this.
    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    /// All counts, row-major.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The counts of row `y`.
    pub fn row(&self, y: usize) -> &[u32] {
        &self.counts[y * self.width..(y + 1) * self.width]
    }

    /// The count at column `x`, row `y`.
    pub fn at(&self, x: usize, y: usize) -> u32 {
        self.counts[y * self.width + x]
    }
}

fn fill_row(samples: &[Complex<f64>], out: &mut [u32], max_iter: u32) {
    for (c, count) in samples.iter().zip(out.iter_mut()) {
        *count = escape_time(*c, max_iter);
    }
}

/// The main function for single-threaded use.  Sweeps the grid row by
/// row on the calling thread.
pub fn escape_field_single(grid: &SampleGrid, max_iter: u32) -> IterationField {
    let mut counts = vec![0 as u32; grid.len()];
    for (y, row) in counts.chunks_mut(grid.width()).enumerate() {
        fill_row(grid.row(y), row, max_iter);
    }
    IterationField {
        width: grid.width(),
        height: grid.height(),
        max_iter,
        counts,
    }
}

/// A multi-threaded version of the kernel that takes a thread count.
///
/// Rows of the output buffer are handed out from a shared queue; each
/// row is a disjoint mutable slice, so workers never write the same
/// cell and the buffer itself needs no lock.  The calling thread works
/// the queue too, which means rows still get done if a worker can't be
/// spawned.
#[cfg(feature = "parallel")]
pub fn escape_field_threaded(
    grid: &SampleGrid,
    max_iter: u32,
    threads: usize,
) -> Result<IterationField> {
    use std::sync::Mutex;
    use tracing::warn;

    fn drain<'a, I>(queue: &Mutex<I>, grid: &SampleGrid, max_iter: u32)
    where
        I: Iterator<Item = (usize, &'a mut [u32])>,
    {
        loop {
            let next = match queue.lock() {
                Ok(mut rows) => rows.next(),
                Err(poisoned) => poisoned.into_inner().next(),
            };
            match next {
                Some((y, row)) => fill_row(grid.row(y), row, max_iter),
                None => break,
            }
        }
    }

    let mut counts = vec![0 as u32; grid.len()];
    {
        let queue = Mutex::new(counts.chunks_mut(grid.width()).enumerate());
        let queue = &queue;
        crossbeam::scope(|spawner| {
            for worker in 1..threads {
                let spawned = spawner
                    .builder()
                    .name(format!("escape-{}", worker))
                    .spawn(move |_| drain(queue, grid, max_iter));
                if let Err(e) = spawned {
                    warn!(worker, error = %e, "could not spawn worker; continuing with fewer threads");
                    break;
                }
            }
            drain(queue, grid, max_iter);
        })
        .map_err(|_| MandelError::WorkerPanicked)?;
    }

    Ok(IterationField {
        width: grid.width(),
        height: grid.height(),
        max_iter,
        counts,
    })
}

/// Without the `parallel` feature there is nothing to spread the work
/// over, so this is the scalar path under another name.
#[cfg(not(feature = "parallel"))]
pub fn escape_field_threaded(
    grid: &SampleGrid,
    max_iter: u32,
    _threads: usize,
) -> Result<IterationField> {
    Ok(escape_field_single(grid, max_iter))
}

/// Which implementation of the kernel to run.  Both produce identical
/// fields; the threaded one is only faster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// Sweep the grid on the calling thread.
    Scalar,
    /// Split rows across this many threads, including the caller.
    Threaded {
        /// Total number of threads working the grid
        threads: usize,
    },
}

impl Kernel {
    /// Picks the threaded kernel when it can actually help: the crate
    /// was built with the `parallel` feature, more than one thread was
    /// asked for, and the machine has more than one CPU.  The thread
    /// count is capped at the number of CPUs.  Anything else gets the
    /// scalar kernel.
    pub fn detect(requested_threads: usize) -> Kernel {
        let cpus = num_cpus::get();
        let threads = requested_threads.min(cpus);
        if cfg!(feature = "parallel") && threads > 1 {
            Kernel::Threaded { threads }
        } else {
            Kernel::Scalar
        }
    }

    /// A short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Threaded { .. } => "threaded",
        }
    }

    /// Runs the kernel over `grid`.  Fails only on a zero iteration
    /// bound or a panicking worker.
    pub fn compute(&self, grid: &SampleGrid, max_iter: u32) -> Result<IterationField> {
        if max_iter == 0 {
            return Err(MandelError::InvalidIterations(max_iter));
        }

        let started = Instant::now();
        let field = match *self {
            Kernel::Scalar => escape_field_single(grid, max_iter),
            Kernel::Threaded { threads } => escape_field_threaded(grid, max_iter, threads)?,
        };
        let elapsed = started.elapsed();

        debug!(
            kernel = self.name(),
            escaped = field.counts.iter().filter(|&&n| n < max_iter).count(),
            "field complete"
        );
        info!(
            kernel = self.name(),
            width = grid.width(),
            height = grid.height(),
            max_iter,
            elapsed_ms = elapsed.as_millis() as u64,
            "computed escape times"
        );
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn origin_never_escapes() {
        for &max_iter in &[1, 2, 50, 256, 10_000] {
            assert_eq!(escape_time(Complex::new(0.0, 0.0), max_iter), max_iter);
        }
    }

    #[test]
    fn minus_one_is_a_bounded_two_cycle() {
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 1000), 1000);
    }

    #[test]
    fn minus_two_sits_on_the_boundary_forever() {
        // 0 -> -2 -> 2 -> 2 -> ...; |z|^2 == 4.0 never exceeds the bound.
        assert_eq!(escape_time(Complex::new(-2.0, 0.0), 500), 500);
    }

    #[test]
    fn magnitude_exactly_two_does_not_escape() {
        // z1 = 2 has squared magnitude 4.0, which keeps going; z2 = 6 escapes.
        assert_eq!(escape_time(Complex::new(2.0, 0.0), 50), 2);
    }

    #[test]
    fn three_escapes_after_one_step() {
        assert_eq!(escape_time(Complex::new(3.0, 0.0), 50), 1);
        assert_eq!(escape_time(Complex::new(0.0, 3.0), 50), 1);
    }

    #[test]
    fn count_is_capped_by_the_bound() {
        // c = 2 needs two steps to escape; with a bound of 1 we stop first.
        assert_eq!(escape_time(Complex::new(2.0, 0.0), 1), 1);
    }

    fn symmetric_grid() -> SampleGrid {
        // Imaginary samples are -1.125 + k * 0.28125, all exact, so row y
        // and row (h - 1 - y) are exact conjugates.
        SampleGrid::centered(16, 9, Complex::new(-0.5, 0.0), 2.0).unwrap()
    }

    #[test]
    fn field_has_the_shape_of_the_grid() {
        for &(w, h) in &[(1, 1), (1, 7), (7, 1), (13, 5)] {
            let grid = SampleGrid::centered(w, h, Complex::new(-0.75, 0.0), 2.5).unwrap();
            let field = escape_field_single(&grid, 20);
            assert_eq!(field.width(), w);
            assert_eq!(field.height(), h);
            assert_eq!(field.counts().len(), w * h);
            assert_eq!(field.max_iter(), 20);
        }
    }

    #[test]
    fn every_count_is_within_the_bound() {
        let grid = SampleGrid::centered(40, 30, Complex::new(-0.75, 0.0), 2.5).unwrap();
        let field = escape_field_single(&grid, 64);
        assert!(field.counts().iter().all(|&n| n <= 64));
        assert!(field.counts().iter().any(|&n| n == 64));
        assert!(field.counts().iter().any(|&n| n < 64));
    }

    #[test]
    fn field_is_symmetric_about_the_real_axis() {
        let grid = symmetric_grid();
        let h = grid.height();
        for y in 0..h {
            assert_eq!(grid.at(0, y).im, -grid.at(0, h - 1 - y).im);
        }
        let field = escape_field_single(&grid, 200);
        for y in 0..h {
            assert_eq!(field.row(y), field.row(h - 1 - y), "row {}", y);
        }
    }

    #[test]
    fn computing_twice_gives_the_same_field() {
        let grid = symmetric_grid();
        let kernel = Kernel::Scalar;
        assert_eq!(
            kernel.compute(&grid, 100).unwrap(),
            kernel.compute(&grid, 100).unwrap()
        );
    }

    #[test]
    fn threaded_matches_scalar() {
        let grid = SampleGrid::centered(37, 23, Complex::new(-0.75, 0.1), 1.7).unwrap();
        let single = escape_field_single(&grid, 300);
        for &threads in &[1, 2, 3, 8, 64] {
            let threaded = escape_field_threaded(&grid, 300, threads).unwrap();
            assert_eq!(single, threaded, "threads = {}", threads);
        }
    }

    #[test]
    fn threaded_matches_scalar_on_random_axes() {
        let mut rng = StdRng::seed_from_u64(0x6d61_6e64);
        for _ in 0..5 {
            let width = rng.gen_range(1, 40);
            let height = rng.gen_range(1, 40);
            let mut re: Vec<f64> = (0..width).map(|_| rng.gen_range(-2.5, 1.0)).collect();
            let mut im: Vec<f64> = (0..height).map(|_| rng.gen_range(-1.5, 1.5)).collect();
            re.sort_by(|a, b| a.partial_cmp(b).unwrap());
            im.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let grid = SampleGrid::from_axes(&re, &im).unwrap();
            let max_iter = rng.gen_range(1, 400);
            assert_eq!(
                escape_field_single(&grid, max_iter),
                escape_field_threaded(&grid, max_iter, 4).unwrap()
            );
        }
    }

    #[test]
    fn more_threads_than_rows_is_fine() {
        let grid = SampleGrid::centered(5, 2, Complex::new(0.0, 0.0), 2.0).unwrap();
        let field = escape_field_threaded(&grid, 10, 16).unwrap();
        assert_eq!(field, escape_field_single(&grid, 10));
    }

    #[test]
    fn three_by_one_regression_fixture() {
        let grid = SampleGrid::centered(3, 1, Complex::new(0.0, 0.0), 2.0).unwrap();
        let field = Kernel::Scalar.compute(&grid, 50).unwrap();
        assert_eq!(field.counts(), &[50, 50, 2]);
        let field = Kernel::Threaded { threads: 2 }.compute(&grid, 50).unwrap();
        assert_eq!(field.counts(), &[50, 50, 2]);
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let grid = symmetric_grid();
        match Kernel::Scalar.compute(&grid, 0) {
            Err(MandelError::InvalidIterations(0)) => {}
            other => panic!("expected InvalidIterations, got {:?}", other),
        }
    }

    #[test]
    fn detect_falls_back_to_scalar_for_one_thread() {
        assert_eq!(Kernel::detect(1), Kernel::Scalar);
        assert_eq!(Kernel::detect(0), Kernel::Scalar);
    }

    #[test]
    fn detect_never_exceeds_the_cpu_count() {
        match Kernel::detect(usize::max_value()) {
            Kernel::Threaded { threads } => {
                assert!(threads > 1);
                assert!(threads <= num_cpus::get());
            }
            Kernel::Scalar => assert!(num_cpus::get() == 1 || !cfg!(feature = "parallel")),
        }
    }
}
