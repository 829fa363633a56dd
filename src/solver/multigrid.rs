use super::{residual_into, Coefficients, LinearSolver, LinearSolverConfig, Weighting};
use crate::{
    error::{FluidError, Result},
    set_boundary, Field2, Grid2, Orientation,
};

/// Grids for every multigrid depth, finest first.
///
/// The coarsest grid must keep at least [`Grid2::MIN_RESOLUTION`] interior
/// cells and the resolution must halve evenly down to it.
pub fn level_grids(grid: Grid2, levels: usize) -> Result<Vec<Grid2>> {
    if levels == 0 {
        return Err(FluidError::NoLevels);
    }
    let resolution = grid.resolution();
    let divisor = u32::try_from(levels - 1)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift));
    let coarsest = divisor.map_or(0, |divisor| resolution / divisor);
    if coarsest < Grid2::MIN_RESOLUTION {
        return Err(FluidError::LevelsTooDeep {
            levels,
            coarsest,
            min: Grid2::MIN_RESOLUTION,
        });
    }
    let divisor = divisor.unwrap_or(usize::MAX);
    if resolution % divisor != 0 {
        return Err(FluidError::IndivisibleResolution {
            resolution,
            levels,
            divisor,
        });
    }
    Ok((0..levels).map(|depth| Grid2::new(resolution >> depth)).collect())
}

/// Restricts `fine` onto `coarse`, pairing coarse cell `o` with fine cell
/// `2o - 1`. Ghost cells of `fine` are read, so enforce its boundary first.
pub fn restrict(fine: &Field2, coarse: &mut Field2, weighting: Weighting) {
    assert_eq!(
        fine.grid().resolution(),
        2 * coarse.grid().resolution(),
        "restrict needs a grid of half the resolution"
    );
    coarse.fill_interior_with(|o, p| {
        let i = 2 * o - 1;
        let j = 2 * p - 1;
        let centre = fine.get(i, j);
        let edges = fine.get(i - 1, j) + fine.get(i + 1, j) + fine.get(i, j - 1) + fine.get(i, j + 1);
        match weighting {
            Weighting::Half => 0.5 * centre + 0.125 * edges,
            Weighting::Full => {
                let diagonals = fine.get(i - 1, j - 1)
                    + fine.get(i + 1, j - 1)
                    + fine.get(i - 1, j + 1)
                    + fine.get(i + 1, j + 1);
                0.25 * centre + 0.125 * edges + 0.0625 * diagonals
            }
        }
    });
}

/// Bilinearly interpolates `coarse` and adds it onto the interior of `fine`.
/// Fine cells on the last row/column reach into the coarse ghost layer, so
/// the coarse boundary must be current.
pub fn prolong(coarse: &Field2, fine: &mut Field2) {
    assert_eq!(
        fine.grid().resolution(),
        2 * coarse.grid().resolution(),
        "prolong needs a grid of half the resolution"
    );
    fine.update_interior_with(|i, j, old| {
        let mut value = old;
        for (o, wx) in prolong_taps(i) {
            for (p, wy) in prolong_taps(j) {
                value += wx * wy * coarse.get(o, p);
            }
        }
        value
    });
}

fn prolong_taps(i: usize) -> [(usize, f32); 2] {
    if i % 2 == 1 {
        [((i + 1) / 2, 1.0), ((i + 1) / 2, 0.0)]
    } else {
        [(i / 2, 0.5), (i / 2 + 1, 0.5)]
    }
}

struct Level {
    x: Field2,
    x0: Field2,
    residual: Field2,
}

impl Level {
    fn new(grid: Grid2) -> Self {
        Self {
            x: Field2::zeros(grid),
            x0: Field2::zeros(grid),
            residual: Field2::zeros(grid),
        }
    }
}

/// One V-cycle per `relax` call around an inner smoother. Depth 0 works on
/// the caller's fields; deeper levels live in an arena that only exists for
/// the duration of the call.
pub struct Multigrid {
    grids: Vec<Grid2>,
    smoother: Box<dyn LinearSolver>,
    config: LinearSolverConfig,
}

impl Multigrid {
    pub fn new(
        grid: Grid2,
        levels: usize,
        smoother: Box<dyn LinearSolver>,
        config: LinearSolverConfig,
    ) -> Result<Self> {
        let grids = level_grids(grid, levels)?;
        log::debug!(
            "multigrid with {} smoother over {:?}",
            smoother.name(),
            grids.iter().map(Grid2::resolution).collect::<Vec<_>>()
        );
        Ok(Self {
            grids,
            smoother,
            config,
        })
    }

    pub fn levels(&self) -> usize {
        self.grids.len()
    }

    fn level_coefficients(&self, finest: Coefficients) -> Vec<Coefficients> {
        let stencil = self.config.stencil;
        std::iter::successors(Some(finest), |coefficients| {
            Some(coefficients.coarsened(stencil))
        })
        .take(self.grids.len())
        .collect()
    }
}

impl LinearSolver for Multigrid {
    fn name(&self) -> &'static str {
        "multigrid"
    }

    fn relax(
        &mut self,
        orientation: Orientation,
        iterations: usize,
        x: &mut Field2,
        x0: &Field2,
        coefficients: Coefficients,
    ) {
        assert_eq!(x.grid(), self.grids[0], "multigrid grid mismatch");
        let weighting = self.config.weighting;
        let coefficients = self.level_coefficients(coefficients);

        self.smoother
            .relax(orientation, iterations, x, x0, coefficients[0]);
        if self.grids.len() == 1 {
            return;
        }

        let mut arena: Vec<Level> = self.grids[1..].iter().copied().map(Level::new).collect();
        let mut residual = Field2::zeros(self.grids[0]);
        residual_into(&mut residual, x, x0, coefficients[0]);
        set_boundary(orientation, &mut residual);
        restrict(&residual, &mut arena[0].x0, weighting);

        // arena[d - 1] holds depth d.
        let coarsest = arena.len();
        for depth in 1..coarsest {
            let (finer, coarser) = arena.split_at_mut(depth);
            let level = &mut finer[depth - 1];
            self.smoother.relax(
                orientation,
                iterations,
                &mut level.x,
                &level.x0,
                coefficients[depth],
            );
            residual_into(&mut level.residual, &level.x, &level.x0, coefficients[depth]);
            set_boundary(orientation, &mut level.residual);
            restrict(&level.residual, &mut coarser[0].x0, weighting);
        }

        let bottom = &mut arena[coarsest - 1];
        self.smoother.relax(
            orientation,
            iterations,
            &mut bottom.x,
            &bottom.x0,
            coefficients[coarsest],
        );

        for depth in (1..coarsest).rev() {
            let (finer, coarser) = arena.split_at_mut(depth);
            let level = &mut finer[depth - 1];
            let correction = &mut coarser[0].x;
            set_boundary(orientation, correction);
            prolong(correction, &mut level.x);
            set_boundary(orientation, &mut level.x);
            self.smoother.relax(
                orientation,
                iterations,
                &mut level.x,
                &level.x0,
                coefficients[depth],
            );
        }

        let correction = &mut arena[0].x;
        set_boundary(orientation, correction);
        prolong(correction, x);
        set_boundary(orientation, x);
        self.smoother
            .relax(orientation, iterations, x, x0, coefficients[0]);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "multigrid v-cycle residual {:.3e}",
                super::residual_norm(x, x0, coefficients[0])
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{residual_norm, GaussSeidel, Jacobi};

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn constant_round_trip(weighting: Weighting) {
        let fine_grid = Grid2::new(16);
        let coarse_grid = fine_grid.coarsen().unwrap();
        let fine = Field2::new(fine_grid, 1.75);
        let mut coarse = Field2::zeros(coarse_grid);
        restrict(&fine, &mut coarse, weighting);
        set_boundary(Orientation::Scalar, &mut coarse);
        let mut back = Field2::zeros(fine_grid);
        prolong(&coarse, &mut back);
        for j in coarse_grid.interior() {
            for i in coarse_grid.interior() {
                assert_close(coarse.get(i, j), 1.75, 1e-6);
            }
        }
        for j in fine_grid.interior() {
            for i in fine_grid.interior() {
                assert_close(back.get(i, j), 1.75, 1e-6);
            }
        }
    }

    #[test]
    fn half_weighting_round_trips_constants() {
        constant_round_trip(Weighting::Half);
    }

    #[test]
    fn full_weighting_round_trips_constants() {
        constant_round_trip(Weighting::Full);
    }

    #[test]
    fn prolong_interpolates_between_coarse_cells() {
        let coarse_grid = Grid2::new(4);
        let mut coarse = Field2::from_fn(coarse_grid, |i, _j| i as f32);
        set_boundary(Orientation::Scalar, &mut coarse);
        let mut fine = Field2::zeros(Grid2::new(8));
        prolong(&coarse, &mut fine);
        assert_close(fine.get(3, 3), 2.0, 1e-6);
        assert_close(fine.get(4, 3), 2.5, 1e-6);
        assert_close(fine.get(4, 4), 2.5, 1e-6);
        // The last fine column averages the edge cell with its mirrored ghost.
        assert_close(fine.get(8, 5), 4.0, 1e-6);
    }

    #[test]
    fn level_grids_halve_resolution() {
        let grids = level_grids(Grid2::new(24), 3).unwrap();
        let resolutions: Vec<usize> = grids.iter().map(Grid2::resolution).collect();
        assert_eq!(resolutions, vec![24, 12, 6]);
        assert_eq!(level_grids(Grid2::new(5), 1).unwrap().len(), 1);
    }

    #[test]
    fn level_grids_reject_invalid_depths() {
        assert!(matches!(level_grids(Grid2::new(16), 0), Err(FluidError::NoLevels)));
        assert!(matches!(
            level_grids(Grid2::new(12), 4),
            Err(FluidError::LevelsTooDeep {
                levels: 4,
                coarsest: 1,
                min: 3
            })
        ));
        assert!(matches!(
            level_grids(Grid2::new(14), 3),
            Err(FluidError::IndivisibleResolution {
                resolution: 14,
                levels: 3,
                divisor: 4
            })
        ));
        assert!(matches!(
            level_grids(Grid2::new(16), 200),
            Err(FluidError::LevelsTooDeep { coarsest: 0, .. })
        ));
    }

    #[test]
    fn v_cycle_beats_plain_smoothing() {
        let grid = Grid2::new(32);
        let mut x0 = Field2::from_fn(grid, |i, j| {
            let x = i as f32 / 32.0;
            let y = j as f32 / 32.0;
            (3.0 * x).sin() + (2.0 * y).cos()
        });
        set_boundary(Orientation::Scalar, &mut x0);
        let coefficients = Coefficients::diffusion(4.0, Default::default());
        let config = LinearSolverConfig::default();

        let mut smoothed = Field2::zeros(grid);
        GaussSeidel::new(config).relax(Orientation::Scalar, 12, &mut smoothed, &x0, coefficients);

        let mut multigrid =
            Multigrid::new(grid, 3, Box::new(GaussSeidel::new(config)), config).unwrap();
        let mut cycled = Field2::zeros(grid);
        // One v-cycle with 4 sweeps on the way down and 4 on the way up at depth 0.
        multigrid.relax(Orientation::Scalar, 4, &mut cycled, &x0, coefficients);

        let smoothed = residual_norm(&smoothed, &x0, coefficients);
        let cycled = residual_norm(&cycled, &x0, coefficients);
        assert!(cycled < smoothed, "multigrid {cycled} smoothing {smoothed}");
    }

    #[test]
    fn single_level_is_the_smoother() {
        let grid = Grid2::new(8);
        let x0 = Field2::from_fn(grid, |i, j| (i * j) as f32);
        let coefficients = Coefficients::new(0.5, 3.0);
        let config = LinearSolverConfig::default();
        let mut multigrid = Multigrid::new(grid, 1, Box::new(Jacobi::new(config)), config).unwrap();
        assert_eq!(multigrid.levels(), 1);
        let mut via_multigrid = Field2::zeros(grid);
        multigrid.relax(Orientation::Scalar, 5, &mut via_multigrid, &x0, coefficients);
        let mut direct = Field2::zeros(grid);
        Jacobi::new(config).relax(Orientation::Scalar, 5, &mut direct, &x0, coefficients);
        assert_eq!(via_multigrid, direct);
    }
}
