use super::{point_update, Coefficients, LinearSolver, LinearSolverConfig};
use crate::{set_boundary, Field2, Orientation};

/// Jacobi relaxation: every sweep reads only the previous sweep's values,
/// staged in a scratch field before being committed (optionally blended
/// with the old value by the SOR factor).
#[derive(Clone, Debug)]
pub struct Jacobi {
    config: LinearSolverConfig,
    scratch: Vec<Field2>,
}

impl Jacobi {
    pub fn new(config: LinearSolverConfig) -> Self {
        Self {
            config,
            scratch: Vec::new(),
        }
    }

    // One buffer per grid size seen, multigrid smooths several.
    fn take_scratch(&mut self, like: &Field2) -> Field2 {
        match self.scratch.iter().position(|field| field.grid() == like.grid()) {
            Some(index) => self.scratch.swap_remove(index),
            None => Field2::zeros(like.grid()),
        }
    }
}

impl LinearSolver for Jacobi {
    fn name(&self) -> &'static str {
        "jacobi"
    }

    fn relax(
        &mut self,
        orientation: Orientation,
        iterations: usize,
        x: &mut Field2,
        x0: &Field2,
        coefficients: Coefficients,
    ) {
        debug_assert_eq!(x.grid(), x0.grid(), "jacobi grid mismatch");
        let mut next = self.take_scratch(x);
        let size = x.grid().size();
        let grid = x.grid();
        let stencil = self.config.stencil;
        let omega = self.config.relaxation;
        let blend = self.config.over_relaxed();
        for _ in 0..iterations {
            {
                let current = x.as_slice();
                let source = x0.as_slice();
                next.fill_interior_with(|i, j| {
                    point_update(current, source, grid.idx(i, j), size, coefficients, stencil)
                });
            }
            if blend {
                x.update_interior_with(|i, j, old| (1.0 - omega) * old + omega * next.get(i, j));
            } else {
                x.update_interior_with(|i, j, _| next.get(i, j));
            }
            set_boundary(orientation, x);
        }
        self.scratch.push(next);
    }
}
