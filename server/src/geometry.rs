/// Euclidean distance between two points.
#[inline]
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

/// Split the vortex pull between the axes.
///
/// Takes the absolute distances to the center along each axis and returns
/// `(ratio_x, ratio_y)`. The smaller distance over the larger gives one ratio,
/// the other gets the remainder, so the two always sum to 1. A point exactly
/// on the center gets no pull at all.
pub fn pull_ratios(dist_x: f64, dist_y: f64) -> (f64, f64) {
    if dist_x == 0.0 && dist_y == 0.0 {
        return (0.0, 0.0);
    }
    if dist_y > dist_x {
        let rat_x = dist_x / dist_y;
        (rat_x, 1.0 - rat_x)
    } else {
        let rat_y = dist_y / dist_x;
        (1.0 - rat_y, rat_y)
    }
}
