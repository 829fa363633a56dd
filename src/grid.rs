use std::ops::RangeInclusive;

/// Square cell-centred grid with one ghost cell on every side.
///
/// `resolution` counts interior cells per axis; storage is `size() * size()`
/// with `size() == resolution + 2`. Interior indices run over `1..=resolution`
/// and indices `0` / `resolution + 1` hold boundary values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid2 {
    resolution: usize,
}

impl Grid2 {
    pub const MIN_RESOLUTION: usize = 3;

    pub fn new(resolution: usize) -> Self {
        assert!(
            resolution >= Self::MIN_RESOLUTION,
            "resolution must be >= {}",
            Self::MIN_RESOLUTION
        );
        Self { resolution }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Padded linear dimension `N`.
    pub fn size(&self) -> usize {
        self.resolution + 2
    }

    pub fn len(&self) -> usize {
        self.size() * self.size()
    }

    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.size() && j < self.size());
        i + self.size() * j
    }

    pub fn interior(&self) -> RangeInclusive<usize> {
        1..=self.resolution
    }

    pub fn interior_cells(&self) -> usize {
        self.resolution * self.resolution
    }

    pub fn is_interior(&self, i: usize, j: usize) -> bool {
        (1..=self.resolution).contains(&i) && (1..=self.resolution).contains(&j)
    }

    /// Grid with half the interior resolution, if it divides evenly and
    /// keeps at least `MIN_RESOLUTION` interior cells.
    pub fn coarsen(&self) -> Option<Self> {
        if self.resolution % 2 != 0 {
            return None;
        }
        let coarse = self.resolution / 2;
        (coarse >= Self::MIN_RESOLUTION).then_some(Self { resolution: coarse })
    }

    pub fn clamp_coord(&self, x: f32) -> f32 {
        x.clamp(0.5, self.resolution as f32 + 0.5)
    }
}
