use super::{apply_operator, residual_into, Coefficients, LinearSolver};
use crate::{set_boundary, Field2, Grid2, Orientation};

struct Scratch {
    r: Field2,
    p: Field2,
    q: Field2,
}

impl Scratch {
    fn new(grid: Grid2) -> Self {
        Self {
            r: Field2::zeros(grid),
            p: Field2::zeros(grid),
            q: Field2::zeros(grid),
        }
    }
}

/// Unpreconditioned conjugate gradient on the five-point operator.
///
/// The search direction gets the same boundary treatment as the unknown
/// before the operator is applied, so the iteration solves exactly the
/// system the relaxation smoothers see.
pub struct ConjugateGradient {
    tolerance: f32,
    scratch: Option<Scratch>,
}

impl ConjugateGradient {
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            scratch: None,
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

impl LinearSolver for ConjugateGradient {
    fn name(&self) -> &'static str {
        "conjugate-gradient"
    }

    fn relax(
        &mut self,
        orientation: Orientation,
        iterations: usize,
        x: &mut Field2,
        x0: &Field2,
        coefficients: Coefficients,
    ) {
        debug_assert_eq!(x.grid(), x0.grid(), "conjugate gradient grid mismatch");
        let grid = x.grid();
        let mut scratch = match self.scratch.take() {
            Some(scratch) if scratch.r.grid() == grid => scratch,
            _ => Scratch::new(grid),
        };
        let Scratch { r, p, q } = &mut scratch;

        set_boundary(orientation, x);
        residual_into(r, x, x0, coefficients);
        p.copy_from(r);
        let mut rho = r.dot(r);
        let threshold = self.tolerance * self.tolerance * rho;

        let mut done = 0;
        while done < iterations && rho != 0.0 && rho > threshold {
            set_boundary(orientation, p);
            {
                let p = &*p;
                q.fill_interior_with(|i, j| apply_operator(p, i, j, coefficients));
            }
            let curvature = p.dot(q);
            if curvature == 0.0 {
                break;
            }
            let alpha = rho / curvature;
            x.update_interior_with(|i, j, value| value + alpha * p.get(i, j));
            r.update_interior_with(|i, j, value| value - alpha * q.get(i, j));
            let rho_old = rho;
            rho = r.dot(r);
            let beta = rho / rho_old;
            p.update_interior_with(|i, j, value| r.get(i, j) + beta * value);
            set_boundary(orientation, x);
            done += 1;
        }
        if done < iterations {
            log::debug!(
                "conjugate gradient stopped after {done}/{iterations} iterations, rho {rho:.3e}"
            );
        }
        self.scratch = Some(scratch);
    }
}
