use crate::{set_boundary, Field2, Orientation};

/// Semi-Lagrangian advection of `src` into `dst` through `(vel_x, vel_y)`.
///
/// Each interior cell traces back `dt * resolution` cells along the velocity
/// sampled at its centre, clamps the departure point into
/// `[0.5, resolution + 0.5]` and samples `src` bilinearly there.
pub fn advect(
    orientation: Orientation,
    dst: &mut Field2,
    src: &Field2,
    vel_x: &Field2,
    vel_y: &Field2,
    dt: f32,
) {
    let grid = dst.grid();
    debug_assert_eq!(src.grid(), grid, "advect grid mismatch");
    debug_assert_eq!(vel_x.grid(), grid, "advect grid mismatch");
    debug_assert_eq!(vel_y.grid(), grid, "advect grid mismatch");
    let dt0 = dt * grid.resolution() as f32;
    dst.fill_interior_with(|i, j| {
        let x = grid.clamp_coord(i as f32 - dt0 * vel_x.get(i, j));
        let y = grid.clamp_coord(j as f32 - dt0 * vel_y.get(i, j));
        src.sample_bilinear(x, y)
    });
    set_boundary(orientation, dst);
}
