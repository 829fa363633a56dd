use super::{point_update, Coefficients, LinearSolver, LinearSolverConfig};
use crate::{set_boundary, Field2, Orientation};

/// Lexicographic Gauss-Seidel, updating in place so later cells in a sweep
/// see the values written earlier in the same sweep.
#[derive(Clone, Copy, Debug)]
pub struct GaussSeidel {
    config: LinearSolverConfig,
}

impl GaussSeidel {
    pub fn new(config: LinearSolverConfig) -> Self {
        Self { config }
    }
}

impl LinearSolver for GaussSeidel {
    fn name(&self) -> &'static str {
        "gauss-seidel"
    }

    fn relax(
        &mut self,
        orientation: Orientation,
        iterations: usize,
        x: &mut Field2,
        x0: &Field2,
        coefficients: Coefficients,
    ) {
        debug_assert_eq!(x.grid(), x0.grid(), "gauss-seidel grid mismatch");
        let grid = x.grid();
        let size = grid.size();
        let stencil = self.config.stencil;
        let omega = self.config.relaxation;
        let blend = self.config.over_relaxed();
        for _ in 0..iterations {
            let values = x.as_mut_slice();
            let source = x0.as_slice();
            for j in grid.interior() {
                for i in grid.interior() {
                    let k = grid.idx(i, j);
                    let update = point_update(values, source, k, size, coefficients, stencil);
                    values[k] = if blend {
                        (1.0 - omega) * values[k] + omega * update
                    } else {
                        update
                    };
                }
            }
            set_boundary(orientation, x);
        }
    }
}
