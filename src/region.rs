//! Positions and regions on a transcript or contig, as described by HGVS.

/// A single coordinate point.
///
/// The ordering is lexicographic on `(downstream, position, offset)`:
/// everything 3' of the stop codon sorts after the coding sequence, 5'-UTR
/// positions carry a negative `position`, and intronic points are ordered by
/// their distance from the nearest exon boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Whether the point lies after the coding sequence (`*` positions).
    pub downstream: bool,
    /// Coordinate magnitude; negative for 5'-UTR positions.
    pub position: i32,
    /// Intronic offset from the nearest exon boundary, 0 for exonic points.
    pub offset: i32,
}

impl Position {
    pub fn new(downstream: bool, position: i32, offset: i32) -> Self {
        Position {
            downstream,
            position,
            offset,
        }
    }

    /// An exonic point inside the coding sequence.
    pub fn exonic(position: i32) -> Self {
        Position::new(false, position, 0)
    }

    /// Whether the point lies outside the CDS: in an intron, in the 5'-UTR,
    /// or after the stop codon.
    pub fn outside_cds(&self) -> bool {
        self.downstream || self.position < 0 || self.offset != 0
    }
}

/// An inclusive interval between two positions, in one coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub start: Position,
    pub end: Position,
}

impl Region {
    pub fn new(start: Position, end: Position) -> Self {
        Region { start, end }
    }

    /// A region covering a single point.
    pub fn point(pos: Position) -> Self {
        Region {
            start: pos,
            end: pos,
        }
    }

    /// Inclusive overlap: regions touching in a single coordinate overlap.
    /// Symmetric in its arguments.
    pub fn overlaps(&self, other: &Region) -> bool {
        (self.start >= other.start && self.start <= other.end)
            || (self.end >= other.start && self.end <= other.end)
            || (self.start < other.start && self.end > other.end)
    }

    /// Whether every point of `other` lies within `self`.
    pub fn contains(&self, other: &Region) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

/// Containment between two optional regions.
///
/// An unconstrained region contains another unconstrained region; a region
/// constraint on exactly one side rules containment out.
pub fn region_contains(region: Option<&Region>, other: Option<&Region>) -> bool {
    match (region, other) {
        (None, None) => true,
        (Some(r1), Some(r2)) => r1.contains(r2),
        _ => false,
    }
}
