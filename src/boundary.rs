use crate::Field2;
use serde::{Deserialize, Serialize};

/// Which quantity a field carries; decides the sign used when mirroring
/// interior values into the ghost layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Scalar,
    X,
    Y,
}

impl Orientation {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Orientation::Scalar),
            1 => Some(Orientation::X),
            2 => Some(Orientation::Y),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Orientation::Scalar => 0,
            Orientation::X => 1,
            Orientation::Y => 2,
        }
    }

    fn left_right_sign(self) -> f32 {
        if self == Orientation::X {
            -1.0
        } else {
            1.0
        }
    }

    fn bottom_top_sign(self) -> f32 {
        if self == Orientation::Y {
            -1.0
        } else {
            1.0
        }
    }
}

/// Mirrors row/column 1 and `n` into the ghost layer, negating the component
/// normal to each wall, then averages the corners from their two edge
/// neighbours. Idempotent.
pub fn set_boundary(orientation: Orientation, field: &mut Field2) {
    let grid = field.grid();
    let n = grid.resolution();
    let last = n + 1;
    let sx = orientation.left_right_sign();
    let sy = orientation.bottom_top_sign();
    let x = field.as_mut_slice();
    for k in 1..=n {
        x[grid.idx(0, k)] = sx * x[grid.idx(1, k)];
        x[grid.idx(last, k)] = sx * x[grid.idx(n, k)];
        x[grid.idx(k, 0)] = sy * x[grid.idx(k, 1)];
        x[grid.idx(k, last)] = sy * x[grid.idx(k, n)];
    }
    x[grid.idx(0, 0)] = 0.5 * (x[grid.idx(1, 0)] + x[grid.idx(0, 1)]);
    x[grid.idx(0, last)] = 0.5 * (x[grid.idx(1, last)] + x[grid.idx(0, n)]);
    x[grid.idx(last, 0)] = 0.5 * (x[grid.idx(n, 0)] + x[grid.idx(last, 1)]);
    x[grid.idx(last, last)] = 0.5 * (x[grid.idx(n, last)] + x[grid.idx(last, n)]);
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

    fn ramp(grid: Grid2) -> Field2 {
        Field2::from_fn(grid, |i, j| (i * 7 + j * 3) as f32 + 1.0)
    }

    #[test]
    fn scalar_copies_edges() {
        let grid = Grid2::new(5);
        let mut field = ramp(grid);
        set_boundary(Orientation::Scalar, &mut field);
        for k in 1..=5 {
            assert_close(field.get(0, k), field.get(1, k), 1e-6);
            assert_close(field.get(6, k), field.get(5, k), 1e-6);
            assert_close(field.get(k, 0), field.get(k, 1), 1e-6);
            assert_close(field.get(k, 6), field.get(k, 5), 1e-6);
        }
    }

    #[test]
    fn x_component_flips_on_vertical_walls_only() {
        let grid = Grid2::new(4);
        let mut field = ramp(grid);
        set_boundary(Orientation::X, &mut field);
        for k in 1..=4 {
            assert_close(field.get(0, k), -field.get(1, k), 1e-6);
            assert_close(field.get(5, k), -field.get(4, k), 1e-6);
            assert_close(field.get(k, 0), field.get(k, 1), 1e-6);
            assert_close(field.get(k, 5), field.get(k, 4), 1e-6);
        }
    }

    #[test]
    fn y_component_flips_on_horizontal_walls_only() {
        let grid = Grid2::new(4);
        let mut field = ramp(grid);
        set_boundary(Orientation::Y, &mut field);
        for k in 1..=4 {
            assert_close(field.get(0, k), field.get(1, k), 1e-6);
            assert_close(field.get(k, 0), -field.get(k, 1), 1e-6);
            assert_close(field.get(k, 5), -field.get(k, 4), 1e-6);
        }
    }

    #[test]
    fn corners_average_adjacent_ghosts() {
        let grid = Grid2::new(4);
        let mut field = ramp(grid);
        set_boundary(Orientation::X, &mut field);
        assert_close(field.get(0, 0), 0.5 * (field.get(1, 0) + field.get(0, 1)), 1e-6);
        assert_close(field.get(5, 5), 0.5 * (field.get(4, 5) + field.get(5, 4)), 1e-6);
        assert_close(field.get(0, 5), 0.5 * (field.get(1, 5) + field.get(0, 4)), 1e-6);
        assert_close(field.get(5, 0), 0.5 * (field.get(4, 0) + field.get(5, 1)), 1e-6);
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let grid = Grid2::new(6);
        let mut field = ramp(grid);
        set_boundary(Orientation::Y, &mut field);
        let once = field.clone();
        set_boundary(Orientation::Y, &mut field);
        assert_eq!(once, field);
    }

    #[test]
    fn tags_round_trip() {
        for tag in 0..3 {
            assert_eq!(Orientation::from_tag(tag).unwrap().tag(), tag);
        }
        assert!(Orientation::from_tag(3).is_none());
    }
}
