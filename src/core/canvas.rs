use nalgebra::{Point2, Vector3};

/// A 2D drawing target for line primitives in device space (Y down).
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn draw_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Vector3<f32>);
}

/// One recorded line primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point2<f32>,
    pub to: Point2<f32>,
    pub color: Vector3<f32>,
}

/// Canvas that keeps the exact device-space segments instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct SegmentRecorder {
    pub width: usize,
    pub height: usize,
    pub segments: Vec<Segment>,
}

impl SegmentRecorder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            segments: Vec::new(),
        }
    }
}

impl Canvas for SegmentRecorder {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn draw_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Vector3<f32>) {
        self.segments.push(Segment { from, to, color });
    }
}

/// Clips a segment to `[0, w] x [0, h]` (Liang-Barsky).
/// Returns `None` if the segment lies outside or contains non-finite coordinates.
pub fn clip_segment(
    from: Point2<f32>,
    to: Point2<f32>,
    w: f32,
    h: f32,
) -> Option<(Point2<f32>, Point2<f32>)> {
    if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
        return None;
    }

    let d = to - from;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;

    for (p, q) in [
        (-d.x, from.x),
        (d.x, w - from.x),
        (-d.y, from.y),
        (d.y, h - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((from + d * t0, from + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_segment_is_unchanged() {
        let (a, b) = clip_segment(Point2::new(1.0, 1.0), Point2::new(5.0, 3.0), 10.0, 10.0).unwrap();
        assert_eq!(a, Point2::new(1.0, 1.0));
        assert_eq!(b, Point2::new(5.0, 3.0));
    }

    #[test]
    fn crossing_segment_is_cut_at_border() {
        let (a, b) =
            clip_segment(Point2::new(-10.0, 5.0), Point2::new(20.0, 5.0), 10.0, 10.0).unwrap();
        assert_eq!(a, Point2::new(0.0, 5.0));
        assert_eq!(b, Point2::new(10.0, 5.0));
    }

    #[test]
    fn outside_or_nan_segments_are_rejected() {
        assert!(clip_segment(Point2::new(-5.0, -5.0), Point2::new(-1.0, -2.0), 10.0, 10.0).is_none());
        assert!(clip_segment(Point2::new(f32::NAN, 0.0), Point2::new(1.0, 1.0), 10.0, 10.0).is_none());
    }
}
