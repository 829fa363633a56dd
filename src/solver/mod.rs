//! Iterative solvers for the per-cell system produced by implicit diffusion
//! and pressure projection:
//!
//! ```text
//! c * x[i,j] - a * (x[i-1,j] + x[i+1,j] + x[i,j-1] + x[i,j+1]) = x0[i,j]
//! ```
//!
//! Every back end takes the same `(orientation, iterations, x, x0, a, c)`
//! arguments so diffusion, projection and the multigrid smoother can share
//! them.

mod conjugate_gradient;
mod gauss_seidel;
mod jacobi;
mod multigrid;

pub use conjugate_gradient::ConjugateGradient;
pub use gauss_seidel::GaussSeidel;
pub use jacobi::Jacobi;
pub use multigrid::{level_grids, prolong, restrict, Multigrid};

use crate::{
    error::{FluidError, Result},
    Field2, Grid2, Orientation,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_CG_TOLERANCE: f32 = 1e-3;
pub const DEFAULT_MULTIGRID_LEVELS: usize = 3;

pub trait LinearSolver: Send {
    fn name(&self) -> &'static str;

    /// Runs `iterations` passes towards the solution of the system for `x`,
    /// re-applying the boundary for `orientation` as it goes.
    fn relax(
        &mut self,
        orientation: Orientation,
        iterations: usize,
        x: &mut Field2,
        x0: &Field2,
        coefficients: Coefficients,
    );
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stencil {
    #[default]
    FivePoint,
    Mehrstellen,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Weighting {
    #[default]
    Half,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSolverConfig {
    pub iterations: usize,
    pub relaxation: f32,
    pub stencil: Stencil,
    pub weighting: Weighting,
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            relaxation: 1.0,
            stencil: Stencil::FivePoint,
            weighting: Weighting::Half,
        }
    }
}

impl LinearSolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(FluidError::ZeroIterations { what: "solver" });
        }
        if !(self.relaxation > 0.0 && self.relaxation < 2.0) {
            return Err(FluidError::InvalidRelaxation(self.relaxation));
        }
        Ok(())
    }

    pub(crate) fn over_relaxed(&self) -> bool {
        (self.relaxation - 1.0).abs() > f32::EPSILON
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub a: f32,
    pub c: f32,
}

impl Coefficients {
    pub fn new(a: f32, c: f32) -> Self {
        Self { a, c }
    }

    /// Implicit Euler diffusion with `a = dt * k * n^2`.
    pub fn diffusion(a: f32, stencil: Stencil) -> Self {
        let c = match stencil {
            Stencil::FivePoint => 1.0 + 4.0 * a,
            Stencil::Mehrstellen => 4.0 + 20.0 * a,
        };
        Self { a, c }
    }

    pub fn poisson(stencil: Stencil) -> Self {
        let c = match stencil {
            Stencil::FivePoint => 4.0,
            Stencil::Mehrstellen => 20.0,
        };
        Self { a: 1.0, c }
    }

    /// Operator for the grid with twice the spacing. The five-point
    /// Laplacian part scales by 1/4 and the identity part is kept.
    pub(crate) fn coarsened(self, stencil: Stencil) -> Self {
        match stencil {
            Stencil::FivePoint => Self {
                a: 0.25 * self.a,
                c: self.c - 3.0 * self.a,
            },
            Stencil::Mehrstellen => self,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Smoother {
    #[default]
    Jacobi,
    GaussSeidel,
}

impl FromStr for Smoother {
    type Err = FluidError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "jacobi" => Ok(Smoother::Jacobi),
            "gauss-seidel" | "gs" => Ok(Smoother::GaussSeidel),
            other => Err(FluidError::UnknownSolver(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SolverChoice {
    Jacobi,
    #[default]
    GaussSeidel,
    ConjugateGradient {
        #[serde(default = "default_cg_tolerance")]
        tolerance: f32,
    },
    Multigrid {
        #[serde(default = "default_multigrid_levels")]
        levels: usize,
        #[serde(default)]
        smoother: Smoother,
    },
}

fn default_cg_tolerance() -> f32 {
    DEFAULT_CG_TOLERANCE
}

fn default_multigrid_levels() -> usize {
    DEFAULT_MULTIGRID_LEVELS
}

impl FromStr for SolverChoice {
    type Err = FluidError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "jacobi" => Ok(SolverChoice::Jacobi),
            "gauss-seidel" | "gs" => Ok(SolverChoice::GaussSeidel),
            "conjugate-gradient" | "cg" => Ok(SolverChoice::ConjugateGradient {
                tolerance: DEFAULT_CG_TOLERANCE,
            }),
            "multigrid" | "mg" => Ok(SolverChoice::Multigrid {
                levels: DEFAULT_MULTIGRID_LEVELS,
                smoother: Smoother::default(),
            }),
            other => Err(FluidError::UnknownSolver(other.to_string())),
        }
    }
}

/// Validates `choice` against `config` and `grid` and builds the solver.
pub fn build_solver(
    choice: SolverChoice,
    config: LinearSolverConfig,
    grid: Grid2,
) -> Result<Box<dyn LinearSolver>> {
    config.validate()?;
    if config.relaxation > 1.0 {
        if let SolverChoice::Jacobi
        | SolverChoice::Multigrid {
            smoother: Smoother::Jacobi,
            ..
        } = choice
        {
            log::warn!(
                "jacobi with relaxation {} > 1 may diverge on the pressure solve",
                config.relaxation
            );
        }
    }
    let solver: Box<dyn LinearSolver> = match choice {
        SolverChoice::Jacobi => Box::new(Jacobi::new(config)),
        SolverChoice::GaussSeidel => Box::new(GaussSeidel::new(config)),
        SolverChoice::ConjugateGradient { tolerance } => {
            if config.stencil != Stencil::FivePoint {
                return Err(FluidError::UnsupportedStencil);
            }
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(FluidError::InvalidTolerance(tolerance));
            }
            Box::new(ConjugateGradient::new(tolerance))
        }
        SolverChoice::Multigrid { levels, smoother } => {
            let inner: Box<dyn LinearSolver> = match smoother {
                Smoother::Jacobi => Box::new(Jacobi::new(config)),
                Smoother::GaussSeidel => Box::new(GaussSeidel::new(config)),
            };
            Box::new(Multigrid::new(grid, levels, inner, config)?)
        }
    };
    Ok(solver)
}

/// One relaxation update of the cell at flat index `k`, reading neighbours
/// from `x`. Ghost cells always exist around interior cells, so no bounds
/// checks beyond the slice's own.
#[inline]
pub(crate) fn point_update(
    x: &[f32],
    x0: &[f32],
    k: usize,
    size: usize,
    coefficients: Coefficients,
    stencil: Stencil,
) -> f32 {
    let Coefficients { a, c } = coefficients;
    let edges = x[k - 1] + x[k + 1] + x[k - size] + x[k + size];
    match stencil {
        Stencil::FivePoint => (x0[k] + a * edges) / c,
        Stencil::Mehrstellen => {
            let d = mehrstellen_edge_weight(a);
            let source_edges = x0[k - 1] + x0[k + 1] + x0[k - size] + x0[k + size];
            let diagonals =
                x[k - size - 1] + x[k - size + 1] + x[k + size - 1] + x[k + size + 1];
            (4.0 * x0[k] + 0.5 * source_edges + d * edges + a * diagonals) / c
        }
    }
}

fn mehrstellen_edge_weight(a: f32) -> f32 {
    if a == 1.0 {
        1.0
    } else {
        4.0 * a - 0.5
    }
}

/// Five-point operator `c * x - a * sum4(x)` at interior cell `(i, j)`.
#[inline]
pub fn apply_operator(x: &Field2, i: usize, j: usize, coefficients: Coefficients) -> f32 {
    coefficients.c * x.get(i, j)
        - coefficients.a * (x.get(i - 1, j) + x.get(i + 1, j) + x.get(i, j - 1) + x.get(i, j + 1))
}

/// `r = x0 - A(x)` over the interior. Ghost cells of `r` are left untouched.
pub fn residual_into(r: &mut Field2, x: &Field2, x0: &Field2, coefficients: Coefficients) {
    debug_assert_eq!(r.grid(), x.grid(), "residual grid mismatch");
    debug_assert_eq!(x0.grid(), x.grid(), "residual grid mismatch");
    r.fill_interior_with(|i, j| x0.get(i, j) - apply_operator(x, i, j, coefficients));
}

/// Root-mean-square residual over the interior.
pub fn residual_norm(x: &Field2, x0: &Field2, coefficients: Coefficients) -> f32 {
    let grid = x.grid();
    let mut sum = 0.0;
    for j in grid.interior() {
        for i in grid.interior() {
            let r = x0.get(i, j) - apply_operator(x, i, j, coefficients);
            sum += r * r;
        }
    }
    (sum / grid.interior_cells() as f32).sqrt()
}
