use crate::geom::{Direction, Pixel};

/// Source of directed link costs over a `width x height` pixel grid.
///
/// Costs are non-negative. `None` means the link cannot be traversed, either
/// because it leaves the grid or touches a no-data pixel.
pub trait LinkCost {
    fn dimensions(&self) -> (usize, usize);

    fn link_cost(&mut self, from: Pixel, dir: Direction) -> Option<f32>;
}
