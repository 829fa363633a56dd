use crate::grid::Grid2;
use rayon::prelude::*;
use std::sync::OnceLock;

const PAR_THRESHOLD_DEFAULT: usize = 65_536;
const PAR_MIN_WORK_PER_THREAD: usize = 4096;

fn parallel_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("FLUID_PAR_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(PAR_THRESHOLD_DEFAULT)
    })
}

pub(crate) fn should_parallel(len: usize) -> bool {
    if len < parallel_threshold() {
        return false;
    }
    let threads = rayon::current_num_threads().max(1);
    len / threads >= PAR_MIN_WORK_PER_THREAD
}

/// Flat scalar field over a padded [`Grid2`], ghost cells included.
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    grid: Grid2,
    data: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldStats {
    pub sum: f32,
    pub min: f32,
    pub max: f32,
    pub non_finite: usize,
}

impl Field2 {
    pub fn new(grid: Grid2, fill: f32) -> Self {
        let data = vec![fill; grid.len()];
        Self { grid, data }
    }

    pub fn zeros(grid: Grid2) -> Self {
        Self::new(grid, 0.0)
    }

    pub fn from_fn(grid: Grid2, f: impl Fn(usize, usize) -> f32) -> Self {
        let size = grid.size();
        let data = (0..grid.len())
            .map(|index| {
                let i = index % size;
                let j = index / size;
                f(i, j)
            })
            .collect();
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[self.grid.idx(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        let index = self.grid.idx(i, j);
        self.data[index] = value;
    }

    pub fn add(&mut self, i: usize, j: usize, value: f32) {
        let index = self.grid.idx(i, j);
        self.data[index] += value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.assert_same_grid(other);
        self.data.copy_from_slice(&other.data);
    }

    /// Bilinear sample at grid coordinates; `(x, y)` must already lie in
    /// `[0.5, resolution + 0.5]` so all four taps exist.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let i0 = x as usize;
        let j0 = y as usize;
        let i1 = i0 + 1;
        let j1 = j0 + 1;
        let s1 = x - i0 as f32;
        let s0 = 1.0 - s1;
        let t1 = y - j0 as f32;
        let t0 = 1.0 - t1;
        s0 * (t0 * self.get(i0, j0) + t1 * self.get(i0, j1))
            + s1 * (t0 * self.get(i1, j0) + t1 * self.get(i1, j1))
    }

    /// Writes `f(i, j)` into every interior cell, leaving ghost cells alone.
    pub fn fill_interior_with(&mut self, f: impl Fn(usize, usize) -> f32 + Sync) {
        let size = self.grid.size();
        let n = self.grid.resolution();
        let fill_row = |(j, row): (usize, &mut [f32])| {
            for (i, value) in row.iter_mut().enumerate().take(n + 1).skip(1) {
                *value = f(i, j);
            }
        };
        if should_parallel(self.data.len()) {
            self.data
                .par_chunks_mut(size)
                .enumerate()
                .skip(1)
                .take(n)
                .for_each(fill_row);
        } else {
            self.data
                .chunks_mut(size)
                .enumerate()
                .skip(1)
                .take(n)
                .for_each(fill_row);
        }
    }

    pub fn update_interior_with(&mut self, f: impl Fn(usize, usize, f32) -> f32 + Sync) {
        let size = self.grid.size();
        let n = self.grid.resolution();
        let update_row = |(j, row): (usize, &mut [f32])| {
            for (i, value) in row.iter_mut().enumerate().take(n + 1).skip(1) {
                *value = f(i, j, *value);
            }
        };
        if should_parallel(self.data.len()) {
            self.data
                .par_chunks_mut(size)
                .enumerate()
                .skip(1)
                .take(n)
                .for_each(update_row);
        } else {
            self.data
                .chunks_mut(size)
                .enumerate()
                .skip(1)
                .take(n)
                .for_each(update_row);
        }
    }

    /// `self += scale * other` over every cell, ghosts included.
    pub fn add_scaled_in_place(&mut self, other: &Self, scale: f32) {
        self.assert_same_grid(other);
        if should_parallel(self.data.len()) {
            self.data
                .par_iter_mut()
                .zip(other.data.par_iter())
                .for_each(|(value, other_value)| *value += other_value * scale);
        } else {
            for (value, other_value) in self.data.iter_mut().zip(other.data.iter()) {
                *value += other_value * scale;
            }
        }
    }

    pub fn interior_sum(&self) -> f32 {
        self.interior_values().sum()
    }

    pub fn interior_mean(&self) -> f32 {
        self.interior_sum() / self.grid.interior_cells() as f32
    }

    pub fn interior_abs_max(&self) -> f32 {
        self.interior_values().map(f32::abs).fold(0.0, f32::max)
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.assert_same_grid(other);
        let grid = self.grid;
        let mut sum = 0.0;
        for j in grid.interior() {
            for i in grid.interior() {
                let index = grid.idx(i, j);
                sum += self.data[index] * other.data[index];
            }
        }
        sum
    }

    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        self.assert_same_grid(other);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }

    pub fn stats(&self) -> FieldStats {
        let mut sum = 0.0;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut non_finite = 0;
        for value in self.interior_values() {
            if !value.is_finite() {
                non_finite += 1;
                continue;
            }
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if min > max {
            min = 0.0;
            max = 0.0;
        }
        FieldStats {
            sum,
            min,
            max,
            non_finite,
        }
    }

    fn interior_values(&self) -> impl Iterator<Item = f32> + '_ {
        let grid = self.grid;
        grid.interior()
            .flat_map(move |j| grid.interior().map(move |i| self.data[grid.idx(i, j)]))
    }

    fn assert_same_grid(&self, other: &Self) {
        assert_eq!(self.grid, other.grid, "field grid mismatch");
    }
}
