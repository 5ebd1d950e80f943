//! Snapping utilities (eg. snap to a grid).

/// Snaps `pos` to the nearest multiple of `grid`.
///
/// Ties round away from zero.
///
/// # Panics
///
/// Panics if `grid` is not positive.
///
/// ```
/// use geometry::snap::snap_to_grid;
///
/// assert_eq!(snap_to_grid(0.1234, 0.001), 0.123);
/// assert_eq!(snap_to_grid(-2.6, 1.), -3.);
/// ```
pub fn snap_to_grid(pos: f64, grid: f64) -> f64 {
    assert!(grid > 0., "grid must be positive");
    (pos / grid).round() * grid
}

/// Rounds `value` to `decimals` digits after the decimal point.
///
/// ```
/// use geometry::snap::round_to;
///
/// assert_eq!(round_to(1.23456, 3), 1.235);
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
