mod advect;
mod boundary;
mod config;
mod error;
mod field;
mod fluid;
mod forces;
mod grid;
mod project;
mod solver;

pub use advect::advect;
pub use boundary::{set_boundary, Orientation};
pub use config::FluidConfig;
pub use error::{FluidError, Result};
pub use field::{Field2, FieldStats};
pub use fluid::FluidSolver;
pub use forces::{add_source, buoyancy_into, curl, vorticity_confinement_into, Buoyancy};
pub use grid::Grid2;
pub use project::{divergence_into, max_divergence, project};
pub use solver::{
    apply_operator, build_solver, level_grids, prolong, residual_into, residual_norm, restrict,
    Coefficients, ConjugateGradient, GaussSeidel, Jacobi, LinearSolver, LinearSolverConfig,
    Multigrid, Smoother, SolverChoice, Stencil, Weighting, DEFAULT_CG_TOLERANCE,
    DEFAULT_MULTIGRID_LEVELS,
};
