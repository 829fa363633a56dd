use crate::Field2;
use serde::{Deserialize, Serialize};

const CONFINEMENT_EPSILON: f32 = 1e-6;

/// `x += dt * x0` over every cell, ghosts included.
pub fn add_source(x: &mut Field2, x0: &Field2, dt: f32) {
    x.add_scaled_in_place(x0, dt);
}

/// Central-difference curl `du/dy - dv/dx` at an interior cell.
pub fn curl(u: &Field2, v: &Field2, i: usize, j: usize) -> f32 {
    let du_dy = 0.5 * (u.get(i, j + 1) - u.get(i, j - 1));
    let dv_dx = 0.5 * (v.get(i + 1, j) - v.get(i - 1, j));
    du_dy - dv_dx
}

/// Vorticity confinement force written into `(fx, fy)`.
///
/// `curl_magnitude` receives `|curl|` over the interior. Only cells whose
/// four neighbours all carry a magnitude (`2..=resolution - 1`) get a force;
/// every other cell of `fx`/`fy` is zeroed.
pub fn vorticity_confinement_into(
    fx: &mut Field2,
    fy: &mut Field2,
    curl_magnitude: &mut Field2,
    u: &Field2,
    v: &Field2,
    strength: f32,
) {
    let grid = u.grid();
    debug_assert_eq!(v.grid(), grid, "vorticity grid mismatch");
    let n = grid.resolution();
    curl_magnitude.fill_interior_with(|i, j| curl(u, v, i, j).abs());
    fx.fill(0.0);
    fy.fill(0.0);

    let w = &*curl_magnitude;
    let gradient = |i: usize, j: usize| {
        let dw_dx = 0.5 * (w.get(i + 1, j) - w.get(i - 1, j));
        let dw_dy = 0.5 * (w.get(i, j + 1) - w.get(i, j - 1));
        let length = (dw_dx * dw_dx + dw_dy * dw_dy).sqrt() + CONFINEMENT_EPSILON;
        (dw_dx / length, dw_dy / length)
    };
    let inner = |i: usize, j: usize| (2..n).contains(&i) && (2..n).contains(&j);
    fx.fill_interior_with(|i, j| {
        if !inner(i, j) {
            return 0.0;
        }
        let (_, ny) = gradient(i, j);
        -strength * ny * curl(u, v, i, j)
    });
    fy.fill_interior_with(|i, j| {
        if !inner(i, j) {
            return 0.0;
        }
        let (nx, _) = gradient(i, j);
        strength * nx * curl(u, v, i, j)
    });
}

/// Temperature-style buoyancy driven by density against its interior mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buoyancy {
    /// Force per unit density.
    pub weight: f32,
    /// Opposing force per unit density above the ambient mean.
    pub lift: f32,
}

impl Default for Buoyancy {
    fn default() -> Self {
        Self {
            weight: 0.000625,
            lift: 0.025,
        }
    }
}

/// Writes `weight * d - lift * (d - ambient)` into the interior of `out`,
/// where `ambient` is the mean interior density.
pub fn buoyancy_into(out: &mut Field2, density: &Field2, buoyancy: Buoyancy) {
    debug_assert_eq!(out.grid(), density.grid(), "buoyancy grid mismatch");
    let ambient = density.interior_mean();
    let Buoyancy { weight, lift } = buoyancy;
    out.fill_interior_with(|i, j| {
        let d = density.get(i, j);
        weight * d - lift * (d - ambient)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid2;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    #[test]
    fn add_source_scales_by_dt() {
        let grid = Grid2::new(4);
        let mut x = Field2::new(grid, 1.0);
        let mut x0 = Field2::zeros(grid);
        x0.set(2, 3, 5.0);
        add_source(&mut x, &x0, 0.1);
        assert_close(x.get(2, 3), 1.5, 1e-6);
        assert_close(x.get(3, 2), 1.0, 1e-6);
    }

    #[test]
    fn curl_of_rigid_rotation_is_uniform() {
        let grid = Grid2::new(8);
        let u = Field2::from_fn(grid, |_i, j| -(j as f32));
        let v = Field2::from_fn(grid, |i, _j| i as f32);
        for j in 2..=7 {
            for i in 2..=7 {
                assert_close(curl(&u, &v, i, j), -2.0, 1e-6);
            }
        }
    }

    #[test]
    fn confinement_is_zero_for_uniform_curl() {
        let grid = Grid2::new(8);
        let u = Field2::from_fn(grid, |_i, j| -(j as f32));
        let v = Field2::from_fn(grid, |i, _j| i as f32);
        let mut fx = Field2::new(grid, 9.0);
        let mut fy = Field2::new(grid, 9.0);
        let mut magnitude = Field2::zeros(grid);
        vorticity_confinement_into(&mut fx, &mut fy, &mut magnitude, &u, &v, 1.0);
        assert_close(fx.interior_abs_max(), 0.0, 1e-6);
        assert_close(fy.interior_abs_max(), 0.0, 1e-6);
        assert_close(fx.get(0, 0), 0.0, 1e-6);
    }

    #[test]
    fn confinement_pushes_toward_stronger_vorticity() {
        let grid = Grid2::new(10);
        // Shear u = j^2 / 2 gives curl = j, growing upward.
        let u = Field2::from_fn(grid, |_i, j| 0.5 * (j * j) as f32);
        let v = Field2::zeros(grid);
        let mut fx = Field2::zeros(grid);
        let mut fy = Field2::zeros(grid);
        let mut magnitude = Field2::zeros(grid);
        vorticity_confinement_into(&mut fx, &mut fy, &mut magnitude, &u, &v, 2.0);
        assert_close(magnitude.get(5, 5), 5.0, 1e-5);
        // Gradient of |curl| points along +y with unit length, so fx = -strength * curl.
        assert_close(fx.get(5, 5), -10.0, 1e-3);
        assert_close(fy.get(5, 5), 0.0, 1e-6);
        // Ring next to the walls stays untouched.
        assert_close(fx.get(1, 5), 0.0, 1e-6);
        assert_close(fx.get(10, 5), 0.0, 1e-6);
        assert_close(fx.get(5, 1), 0.0, 1e-6);
    }

    #[test]
    fn buoyancy_opposes_density_above_ambient() {
        let grid = Grid2::new(4);
        let density = Field2::from_fn(grid, |i, j| if i == 2 && j == 2 { 16.0 } else { 0.0 });
        let mut force = Field2::zeros(grid);
        let buoyancy = Buoyancy::default();
        buoyancy_into(&mut force, &density, buoyancy);
        // Ambient is 16 / 16 = 1.
        assert_close(force.get(2, 2), 0.000625 * 16.0 - 0.025 * 15.0, 1e-6);
        assert_close(force.get(3, 3), 0.025, 1e-6);
    }

    #[test]
    fn buoyancy_deserializes_with_defaults() {
        let buoyancy: Buoyancy = serde_json::from_str(r#"{ "lift": 0.5 }"#).unwrap();
        assert_close(buoyancy.weight, 0.000625, 1e-9);
        assert_close(buoyancy.lift, 0.5, 1e-9);
    }
}
