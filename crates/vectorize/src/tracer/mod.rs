//! Border-following tracer behind the [`TracingService`] interface.

pub mod path;

use geo::{Area, Coord, LineString, Polygon};
use image::{imageops, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour as BorderContour};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use crate::{
    bitmap::PackedBitmap,
    traits::{TraceState, TraceStatus, TracingService},
};
use path::{DPoint, PathList, PathSign, Segment, TracedPath};

/// Which borders end up in the path list.
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContourMode {
    /// Every outer and hole border, at any nesting depth
    #[default]
    Tree,
    /// Only outer borders that are not inside a hole
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TraceParams {
    /// Paths enclosing less polygon area than this are dropped
    #[schemars(range(max = 100000))]
    pub turd_size: u32,
    pub mode: ContourMode,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            turd_size: 0,
            mode: ContourMode::Tree,
        }
    }
}

/// Result of one [`EdgeTracer`] call.
#[derive(Debug)]
pub struct EdgeTraceState {
    status: TraceStatus,
    paths: PathList,
}

impl TraceState for EdgeTraceState {
    fn status(&self) -> &TraceStatus {
        &self.status
    }

    fn paths(&self) -> &PathList {
        &self.paths
    }
}

/// Follows the borders of 8-connected set regions with
/// [`imageproc::contours::find_contours`]. Every border pixel becomes one
/// corner segment; no curve fitting is done.
#[derive(Debug, Clone, Default)]
pub struct EdgeTracer {
    params: TraceParams,
}

impl EdgeTracer {
    pub fn new(params: TraceParams) -> Self {
        Self { params }
    }
}

impl TracingService for EdgeTracer {
    type Params = TraceParams;
    type State = EdgeTraceState;

    fn params(&self) -> TraceParams {
        self.params.clone()
    }

    fn trace(&self, bitmap: &PackedBitmap, params: &TraceParams) -> EdgeTraceState {
        if !bitmap.is_consistent() {
            return EdgeTraceState {
                status: TraceStatus::Failed("bitmap buffer released or malformed".to_string()),
                paths: PathList::empty(),
            };
        }

        let borders = find_contours::<i32>(&with_margin(&bitmap.unpack()));
        let height = bitmap.height() as f64;

        let paths: Vec<TracedPath> = borders
            .iter()
            .filter(|border| match params.mode {
                ContourMode::Tree => true,
                ContourMode::External => {
                    border.border_type == BorderType::Outer && border.parent.is_none()
                }
            })
            .map(|border| to_path(border, height))
            .filter(|path| path.area >= params.turd_size as f64)
            .collect();

        debug!(
            width = bitmap.width(),
            height = bitmap.height(),
            borders = borders.len(),
            paths = paths.len(),
            "traced bitmap"
        );

        EdgeTraceState {
            status: TraceStatus::Ok,
            paths: PathList::from_paths(paths),
        }
    }
}

// find_contours never opens an outer border in column 0, so regions must not
// touch the left edge. Border points come back shifted by one.
fn with_margin(raster: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::from_pixel(raster.width() + 2, raster.height() + 2, Luma([0]));
    imageops::replace(&mut padded, raster, 1, 1);
    padded
}

/// Border points in y-up bitmap coordinates, as closed corner segments
/// ending back at the first point.
fn to_path(border: &BorderContour<i32>, height: f64) -> TracedPath {
    let points: Vec<DPoint> = border
        .points
        .iter()
        .map(|p| DPoint::new((p.x - 1) as f64, height - (p.y - 1) as f64))
        .collect();

    let segments = (0..points.len())
        .map(|i| Segment::corner(points[i], points[(i + 1) % points.len()]))
        .collect();

    let sign = match border.border_type {
        BorderType::Outer => PathSign::Positive,
        BorderType::Hole => PathSign::Negative,
    };

    TracedPath::new(polygon_area(&points), sign, segments)
}

fn polygon_area(points: &[DPoint]) -> f64 {
    let ring: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(ring, vec![]).unsigned_area()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bitmap_from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> PackedBitmap {
        let raster = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([if f(x as usize, y as usize) { 255 } else { 0 }])
        });
        PackedBitmap::pack(&(&raster).into()).unwrap()
    }

    fn traced(bitmap: &PackedBitmap, params: TraceParams) -> Vec<(PathSign, f64, usize)> {
        let state = EdgeTracer::new(params.clone()).trace(bitmap, &params);
        assert_eq!(state.status(), &TraceStatus::Ok);
        state
            .paths()
            .iter()
            .map(|p| (p.sign, p.area, p.segments.len()))
            .collect()
    }

    #[test]
    fn test_contour_mode_names() {
        assert_eq!(ContourMode::from_str("external").unwrap(), ContourMode::External);
        assert_eq!(ContourMode::Tree.to_string(), "tree");
        assert!(ContourMode::from_str("sideways").is_err());
        assert_eq!(<ContourMode as VariantNames>::VARIANTS.len(), 2);
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: TraceParams = serde_json::from_str(r#"{"mode":"external"}"#).unwrap();
        assert_eq!(params.turd_size, 0);
        assert_eq!(params.mode, ContourMode::External);
    }

    #[test]
    fn test_released_bitmap_fails() {
        let mut bitmap = PackedBitmap::new(4, 4);
        bitmap.release();
        let tracer = EdgeTracer::default();

        let state = tracer.trace(&bitmap, &tracer.params());

        assert!(matches!(state.status(), TraceStatus::Failed(_)));
        assert!(state.paths().is_empty());
    }

    #[test]
    fn test_region_touching_every_edge() {
        let mut bitmap = PackedBitmap::new(5, 3);
        for y in 0..3 {
            bitmap.toggle_span(y, 0, 5);
        }
        let tracer = EdgeTracer::default();

        let state = tracer.trace(&bitmap, &tracer.params());

        let paths: Vec<_> = state.paths().iter().collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].sign, PathSign::Positive);
        assert_eq!(paths[0].area, 8.0);
        assert_eq!(paths[0].segments.len(), 12);
        assert!(paths[0].segments.iter().all(|s| s.tag == path::SegmentTag::Corner));

        // y-up: raster row 0 is bitmap y 3
        let ends: Vec<_> = paths[0].terminal_points().collect();
        assert_eq!(ends[0], DPoint::new(0.0, 2.0));
        assert_eq!(*ends.last().unwrap(), DPoint::new(0.0, 3.0));
    }

    #[test]
    fn test_ring_has_outer_and_hole() {
        let bitmap = bitmap_from_fn(50, 50, |x, y| {
            let outer = (5..35).contains(&x) && (5..35).contains(&y);
            let inner = (15..25).contains(&x) && (15..25).contains(&y);
            outer && !inner
        });

        let paths = traced(&bitmap, TraceParams::default());

        assert_eq!(
            paths,
            vec![(PathSign::Positive, 841.0, 116), (PathSign::Negative, 119.0, 40)]
        );
    }

    #[test]
    fn test_external_mode_keeps_top_level_outlines() {
        // ring with an island inside its hole
        let bitmap = bitmap_from_fn(16, 16, |x, y| {
            let ring = (2..14).contains(&x) && (2..14).contains(&y)
                && !((5..11).contains(&x) && (5..11).contains(&y));
            let island = (7..9).contains(&x) && (7..9).contains(&y);
            ring || island
        });

        let tree = traced(&bitmap, TraceParams::default());
        assert_eq!(
            tree.iter().map(|p| p.0).collect::<Vec<_>>(),
            vec![PathSign::Positive, PathSign::Negative, PathSign::Positive]
        );

        let external = traced(
            &bitmap,
            TraceParams {
                mode: ContourMode::External,
                ..TraceParams::default()
            },
        );
        assert_eq!(external, vec![(PathSign::Positive, 121.0, 44)]);
    }

    #[test]
    fn test_turd_size_drops_specks() {
        let bitmap = bitmap_from_fn(8, 8, |x, y| {
            (x, y) == (1, 1) || (y == 1 && (4..6).contains(&x)) || ((1..4).contains(&x) && (4..7).contains(&y))
        });

        assert_eq!(traced(&bitmap, TraceParams::default()).len(), 3);

        let kept = traced(&bitmap, TraceParams { turd_size: 1, ..TraceParams::default() });
        assert_eq!(kept, vec![(PathSign::Positive, 4.0, 8)]);

        assert!(traced(&bitmap, TraceParams { turd_size: 5, ..TraceParams::default() }).is_empty());
    }

    #[test]
    fn test_empty_bitmap_has_no_paths() {
        assert!(traced(&PackedBitmap::new(70, 3), TraceParams::default()).is_empty());
    }

    #[test]
    fn test_source_bitmap_is_untouched() {
        let bitmap = bitmap_from_fn(9, 9, |x, y| (2..7).contains(&x) && (2..7).contains(&y));
        let before = bitmap.words().to_vec();

        traced(&bitmap, TraceParams::default());

        assert_eq!(bitmap.words(), before.as_slice());
    }
}
