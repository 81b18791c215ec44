//! Multi-segment stroke accumulation.
//!
//! A stroke starts at the first seed and grows one frozen segment per anchor.
//! Consecutive segments share their junction pixel, which is stored once.

use lw_core::Pixel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrokeState {
    /// No seed placed.
    #[default]
    Idle,
    /// A session exists but no live segment has been extracted yet.
    Seeded,
    /// A live segment is being previewed.
    Tracking,
    /// The last stroke was finished; the next seed starts a new one.
    Closed,
}

/// A finished polyline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stroke {
    pub points: Vec<Pixel>,
    /// First seed followed by every anchor, in placement order.
    pub control_points: Vec<Pixel>,
    /// True when the stroke returned to its first seed.
    pub closed: bool,
}

impl Stroke {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Appends `segment` to `acc`, dropping the segment's first pixel when it
/// repeats the last accumulated one.
pub fn join_segments(acc: &[Pixel], segment: &[Pixel]) -> Vec<Pixel> {
    let skip = usize::from(!acc.is_empty() && acc.last() == segment.first());
    let mut out = Vec::with_capacity(acc.len() + segment.len());
    out.extend_from_slice(acc);
    out.extend_from_slice(&segment[skip..]);
    out
}

/// Strict box test: `|dx| < tol && |dy| < tol`.
pub fn within_tolerance(a: Pixel, b: Pixel, tol: usize) -> bool {
    a.x.abs_diff(b.x) < tol && a.y.abs_diff(b.y) < tol
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeBuilder {
    points: Vec<Pixel>,
    control_points: Vec<Pixel>,
    segments: usize,
}

impl StrokeBuilder {
    pub fn start(seed: Pixel) -> Self {
        Self {
            points: vec![seed],
            control_points: vec![seed],
            segments: 0,
        }
    }

    pub fn first_seed(&self) -> Pixel {
        self.control_points[0]
    }

    pub fn points(&self) -> &[Pixel] {
        &self.points
    }

    pub fn control_points(&self) -> &[Pixel] {
        &self.control_points
    }

    /// Number of frozen segments.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Accumulated points followed by the live segment.
    pub fn preview(&self, live: &[Pixel]) -> Vec<Pixel> {
        join_segments(&self.points, live)
    }

    /// Freezes `segment`, whose first pixel must be the current end of the
    /// stroke; its last pixel becomes a control point.
    pub fn append_segment(&mut self, segment: &[Pixel]) {
        let Some(&end) = segment.last() else {
            return;
        };
        debug_assert_eq!(segment.first(), self.points.last());
        self.points = join_segments(&self.points, segment);
        self.control_points.push(end);
        self.segments += 1;
    }

    pub fn finish(self, live: &[Pixel], closed: bool) -> Stroke {
        let mut points = join_segments(&self.points, live);
        if closed && points.len() > 1 && points.last() == points.first() {
            points.pop();
        }
        Stroke {
            points,
            control_points: self.control_points,
            closed,
        }
    }
}
