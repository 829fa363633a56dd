use crate::{set_boundary, Coefficients, Field2, LinearSolver, Orientation};

/// Central-difference divergence scaled by `-0.5 / resolution`.
pub fn divergence_into(out: &mut Field2, vel_x: &Field2, vel_y: &Field2) {
    let grid = out.grid();
    debug_assert_eq!(vel_x.grid(), grid, "divergence grid mismatch");
    debug_assert_eq!(vel_y.grid(), grid, "divergence grid mismatch");
    let scale = -0.5 / grid.resolution() as f32;
    out.fill_interior_with(|i, j| {
        scale
            * (vel_x.get(i + 1, j) - vel_x.get(i - 1, j) + vel_y.get(i, j + 1)
                - vel_y.get(i, j - 1))
    });
}

/// Largest absolute discrete divergence over the interior, unscaled by the
/// `-0.5 / resolution` factor used for the Poisson source.
pub fn max_divergence(vel_x: &Field2, vel_y: &Field2) -> f32 {
    let grid = vel_x.grid();
    let mut max = 0.0f32;
    for j in grid.interior() {
        for i in grid.interior() {
            let div = 0.5
                * (vel_x.get(i + 1, j) - vel_x.get(i - 1, j) + vel_y.get(i, j + 1)
                    - vel_y.get(i, j - 1));
            max = max.max(div.abs());
        }
    }
    max
}

/// Makes `(vel_x, vel_y)` approximately divergence free.
///
/// `potential` and `divergence` are scratch fields; on return they hold the
/// solved pressure-like potential and the pre-projection divergence.
pub fn project(
    vel_x: &mut Field2,
    vel_y: &mut Field2,
    potential: &mut Field2,
    divergence: &mut Field2,
    solver: &mut dyn LinearSolver,
    iterations: usize,
    coefficients: Coefficients,
) {
    let grid = vel_x.grid();
    divergence_into(divergence, vel_x, vel_y);
    potential.fill(0.0);
    set_boundary(Orientation::Scalar, divergence);
    set_boundary(Orientation::Scalar, potential);
    solver.relax(Orientation::Scalar, iterations, potential, divergence, coefficients);

    let scale = 0.5 * grid.resolution() as f32;
    let p = &*potential;
    vel_x.update_interior_with(|i, j, u| u - scale * (p.get(i + 1, j) - p.get(i - 1, j)));
    vel_y.update_interior_with(|i, j, v| v - scale * (p.get(i, j + 1) - p.get(i, j - 1)));
    set_boundary(Orientation::X, vel_x);
    set_boundary(Orientation::Y, vel_y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GaussSeidel, Grid2, LinearSolverConfig, Stencil};

    fn swirl(grid: Grid2) -> (Field2, Field2) {
        let n = grid.resolution() as f32;
        let mut u = Field2::from_fn(grid, |i, j| {
            let x = (i as f32 - 0.5) / n;
            let y = (j as f32 - 0.5) / n;
            (std::f32::consts::PI * x).sin() * (1.0 + y)
        });
        let mut v = Field2::from_fn(grid, |i, j| {
            let x = (i as f32 - 0.5) / n;
            let y = (j as f32 - 0.5) / n;
            (std::f32::consts::PI * y).sin() * x
        });
        set_boundary(Orientation::X, &mut u);
        set_boundary(Orientation::Y, &mut v);
        (u, v)
    }

    fn run(u: &mut Field2, v: &mut Field2, iterations: usize) {
        let grid = u.grid();
        let mut potential = Field2::zeros(grid);
        let mut divergence = Field2::zeros(grid);
        let mut solver = GaussSeidel::new(LinearSolverConfig::default());
        project(
            u,
            v,
            &mut potential,
            &mut divergence,
            &mut solver,
            iterations,
            Coefficients::poisson(Stencil::FivePoint),
        );
    }

    #[test]
    fn projection_reduces_divergence() {
        let grid = Grid2::new(24);
        let (mut u, mut v) = swirl(grid);
        let before = max_divergence(&u, &v);
        run(&mut u, &mut v, 200);
        let after = max_divergence(&u, &v);
        assert!(after < 0.5 * before, "before {before} after {after}");
    }

    #[test]
    fn second_projection_changes_less() {
        let grid = Grid2::new(16);
        let (mut u, mut v) = swirl(grid);
        let start_u = u.clone();
        run(&mut u, &mut v, 60);
        let first = u.max_abs_diff(&start_u);
        let once_u = u.clone();
        run(&mut u, &mut v, 60);
        let second = u.max_abs_diff(&once_u);
        assert!(second < first, "first {first} second {second}");
    }

    #[test]
    fn divergence_free_field_is_left_alone() {
        let grid = Grid2::new(16);
        // Discrete stream function psi gives u = dpsi/dy, v = -dpsi/dx,
        // which the central-difference divergence sees as exactly zero.
        let psi = |i: usize, j: usize| {
            let x = i as f32 / 17.0;
            let y = j as f32 / 17.0;
            (std::f32::consts::PI * x).sin().powi(2) * (std::f32::consts::PI * y).sin().powi(2)
        };
        let mut u = Field2::from_fn(grid, |i, j| {
            if grid.is_interior(i, j) {
                0.5 * (psi(i, j + 1) - psi(i, j - 1))
            } else {
                0.0
            }
        });
        let mut v = Field2::from_fn(grid, |i, j| {
            if grid.is_interior(i, j) {
                -0.5 * (psi(i + 1, j) - psi(i - 1, j))
            } else {
                0.0
            }
        });
        set_boundary(Orientation::X, &mut u);
        set_boundary(Orientation::Y, &mut v);
        let before_u = u.clone();
        let before_v = v.clone();
        let divergence = max_divergence(&u, &v);
        run(&mut u, &mut v, 40);
        assert!(divergence < 1e-2, "input divergence {divergence}");
        assert!(u.max_abs_diff(&before_u) < 2e-2);
        assert!(v.max_abs_diff(&before_v) < 2e-2);
    }
}
