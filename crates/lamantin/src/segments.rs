//! Vertical segments: one edge's trunk run at one layer boundary.

use lamantin_lgraph::EdgeId;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSegment {
    pub boundary: usize,
    pub rank: usize,
    /// The real edge, not the dummy segment.
    pub edge: EdgeId,
    pub start: f64,
    pub end: f64,
}

impl VerticalSegment {
    pub fn new(boundary: usize, rank: usize, edge: EdgeId, start: f64, end: f64) -> Self {
        Self {
            boundary,
            rank,
            edge,
            start,
            end,
        }
    }

    pub fn top(&self) -> f64 {
        self.start.min(self.end)
    }

    pub fn bottom(&self) -> f64 {
        self.start.max(self.end)
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).abs()
    }

    /// Half-open `[top, bottom)` intersection test.
    pub fn overlaps(&self, other: &VerticalSegment) -> bool {
        (self.top() <= other.top() && self.bottom() > other.top())
            || (self.top() >= other.top() && self.top() < other.bottom())
    }

    pub fn include(&mut self, pos: f64) {
        let (top, bottom) = (self.top().min(pos), self.bottom().max(pos));
        self.start = top;
        self.end = bottom;
    }

    pub fn include_segment(&mut self, other: &VerticalSegment) {
        self.include(other.top());
        self.include(other.bottom());
    }
}

/// Segments indexed by real edge and by boundary and slot.
#[derive(Debug, Clone, Default)]
pub struct SegmentRegistry {
    by_edge: FxHashMap<EdgeId, Vec<VerticalSegment>>,
    by_boundary: FxHashMap<usize, BTreeMap<usize, Vec<VerticalSegment>>>,
}

impl SegmentRegistry {
    pub fn record(&mut self, segment: VerticalSegment) {
        self.by_edge.entry(segment.edge).or_default().push(segment);
        self.by_boundary
            .entry(segment.boundary)
            .or_default()
            .entry(segment.rank)
            .or_default()
            .push(segment);
    }

    pub fn for_edge(&self, edge: EdgeId) -> &[VerticalSegment] {
        self.by_edge.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_slot(&self, boundary: usize, rank: usize) -> &[VerticalSegment] {
        self.by_boundary
            .get(&boundary)
            .and_then(|slots| slots.get(&rank))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn highest_rank(&self, boundary: usize) -> Option<usize> {
        self.by_boundary
            .get(&boundary)
            .and_then(|slots| slots.keys().next_back().copied())
    }
}
