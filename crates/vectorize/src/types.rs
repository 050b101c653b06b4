use geo_types::{Coord, LineString, Polygon};
use image::{ColorType, DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Result, VectorizeError};

/// Borrowed view over an 8-bit frame buffer, row-major, channels interleaved.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    width: u32,
    height: u32,
    channels: u8,
    data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(width: u32, height: u32, channels: u8, data: &'a [u8]) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(VectorizeError::FrameSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Single-channel view over `width * height` luminance bytes.
    pub fn gray(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        Self::new(width, height, 1, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Fails with `UnsupportedChannelCount` unless the view has exactly one channel.
    pub fn require_single_channel(&self) -> Result<()> {
        if self.channels == 1 {
            Ok(())
        } else {
            Err(VectorizeError::UnsupportedChannelCount {
                channels: self.channels,
            })
        }
    }

    pub fn row(&self, y: u32) -> &'a [u8] {
        let len = self.width as usize * self.channels as usize;
        let start = y as usize * len;
        &self.data[start..start + len]
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }
}

impl<'a> From<&'a GrayImage> for FrameView<'a> {
    fn from(image: &'a GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 1,
            data: image.as_raw(),
        }
    }
}

impl<'a> TryFrom<&'a DynamicImage> for FrameView<'a> {
    type Error = VectorizeError;

    fn try_from(image: &'a DynamicImage) -> Result<Self> {
        let color = image.color();
        match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => Self::new(
                image.width(),
                image.height(),
                color.channel_count(),
                image.as_bytes(),
            ),
            other => Err(VectorizeError::UnsupportedSampleFormat(other)),
        }
    }
}

/// Whether a contour bounds a region or a hole inside one.
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContourKind {
    #[default]
    Outer,
    Hole,
}

/// A closed polygon in raster coordinates (origin top-left, y down).
/// The last point connects back to the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<[i32; 2]>,
    #[serde(default)]
    pub kind: ContourKind,
}

impl Contour {
    pub fn new(points: Vec<[i32; 2]>) -> Self {
        Self {
            points,
            kind: ContourKind::Outer,
        }
    }

    pub fn hole(points: Vec<[i32; 2]>) -> Self {
        Self {
            points,
            kind: ContourKind::Hole,
        }
    }

    pub fn is_hole(&self) -> bool {
        self.kind == ContourKind::Hole
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, including the closing edge from last to first.
    pub fn edges(&self) -> impl Iterator<Item = ([i32; 2], [i32; 2])> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|&[x, y]| Coord {
                x: x as f64,
                y: y as f64,
            })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area, independent of winding direction.
    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    /// Min and max corners, or `None` for an empty contour.
    pub fn bounding_box(&self) -> Option<([i32; 2], [i32; 2])> {
        let first = *self.points.first()?;
        let (mut min, mut max) = (first, first);
        for &[x, y] in &self.points[1..] {
            min = [min[0].min(x), min[1].min(y)];
            max = [max[0].max(x), max[1].max(y)];
        }
        Some((min, max))
    }
}

/// Everything produced for one frame: the threshold that was applied, the
/// binary raster, and the traced contours.
#[derive(Debug, Clone)]
pub struct TracedFrame {
    pub median: u8,
    pub threshold: u8,
    pub raster: GrayImage,
    pub contours: Vec<Contour>,
}

impl TracedFrame {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }
}
