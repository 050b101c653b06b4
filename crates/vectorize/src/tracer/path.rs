//! Path list produced by a tracing service: a singly linked list of closed
//! paths, each carrying a curve made of tagged segments.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DPoint {
    pub x: f64,
    pub y: f64,
}

impl DPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTag {
    /// Straight lines through the vertex `c[1]` to `c[2]`.
    Corner,
    /// Cubic Bezier with control points `c[0]`, `c[1]` ending at `c[2]`.
    CurveTo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub tag: SegmentTag,
    pub c: [DPoint; 3],
}

impl Segment {
    pub fn corner(vertex: DPoint, end: DPoint) -> Self {
        Self {
            tag: SegmentTag::Corner,
            c: [vertex, vertex, end],
        }
    }

    pub fn curve_to(c0: DPoint, c1: DPoint, end: DPoint) -> Self {
        Self {
            tag: SegmentTag::CurveTo,
            c: [c0, c1, end],
        }
    }

    pub fn end_point(&self) -> DPoint {
        self.c[2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSign {
    /// Outer boundary of a set region.
    Positive,
    /// Boundary of a hole.
    Negative,
}

#[derive(Debug)]
pub struct TracedPath {
    pub area: f64,
    pub sign: PathSign,
    pub segments: Vec<Segment>,
    next: Option<Box<TracedPath>>,
}

impl TracedPath {
    pub fn new(area: f64, sign: PathSign, segments: Vec<Segment>) -> Self {
        Self {
            area,
            sign,
            segments,
            next: None,
        }
    }

    pub fn next(&self) -> Option<&TracedPath> {
        self.next.as_deref()
    }

    /// End point of every segment, in order.
    pub fn terminal_points(&self) -> impl Iterator<Item = DPoint> + '_ {
        self.segments.iter().map(Segment::end_point)
    }
}

#[derive(Debug, Default)]
pub struct PathList {
    head: Option<Box<TracedPath>>,
}

impl PathList {
    pub fn empty() -> Self {
        Self { head: None }
    }

    /// Link `paths` in the given order.
    pub fn from_paths(paths: Vec<TracedPath>) -> Self {
        let mut head = None;
        for mut path in paths.into_iter().rev() {
            path.next = head;
            head = Some(Box::new(path));
        }
        Self { head }
    }

    pub fn head(&self) -> Option<&TracedPath> {
        self.head.as_deref()
    }

    pub fn iter(&self) -> Paths<'_> {
        Paths {
            next: self.head.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl Drop for PathList {
    // unlink iteratively; the default recursive drop can overflow on long lists
    fn drop(&mut self) {
        let mut cursor = self.head.take();
        while let Some(mut path) = cursor {
            cursor = path.next.take();
        }
    }
}

impl<'a> IntoIterator for &'a PathList {
    type Item = &'a TracedPath;
    type IntoIter = Paths<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing head-to-tail walk over a [`PathList`].
pub struct Paths<'a> {
    next: Option<&'a TracedPath>,
}

impl<'a> Iterator for Paths<'a> {
    type Item = &'a TracedPath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next();
        Some(current)
    }
}
