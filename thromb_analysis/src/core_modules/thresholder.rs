// THEORY:
// The thresholder is the first pass. The scan's global minimum is treated as
// the background level and everything strictly brighter is foreground. There is
// no multi-level thresholding: the foreground/background split is assumed to be
// already present in the data (e.g. a label image produced upstream).

use crate::core_modules::grid::{IntensityGrid, Mask};

/// Marks every cell whose intensity is strictly above the global minimum.
///
/// A constant grid has no foreground. NaN cells are never foreground.
pub fn threshold_above_minimum(grid: &IntensityGrid) -> Mask {
    match grid.min_value() {
        Some(background) => grid.map(|&value| value > background),
        None => Mask::filled(grid.width(), grid.height(), false),
    }
}
