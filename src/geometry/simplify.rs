use crate::domain::Polygon;

/// A decimated polygon together with the stride that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplificationResult {
    pub polygon: Polygon,
    pub stride: usize,
}

/// Keep every `stride`-th point starting at index 0, then close the ring.
///
/// This is index-based decimation: order is preserved and no point is
/// moved. A stride of 0 is treated as 1.
pub fn simplify(polygon: &Polygon, stride: usize) -> SimplificationResult {
    let stride = stride.max(1);

    let mut points: Vec<_> = polygon.points().iter().step_by(stride).copied().collect();

    if let (Some(&first), Some(&last)) = (points.first(), points.last())
        && first != last
    {
        points.push(first);
    }

    SimplificationResult {
        polygon: Polygon::new(points),
        stride,
    }
}

/// Smallest stride that brings `point_count` down to about `target` points.
pub fn stride_for_target(point_count: usize, target: usize) -> usize {
    if target == 0 {
        return 1;
    }
    point_count.div_ceil(target).max(1)
}
