use geo::{BoundingRect, LineString};

use crate::domain::{Coordinate, MapSize, Polygon};

/// Approximate kilometers per degree of latitude (and of longitude at the
/// equator).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Zoom pairs keyed by the lower bound (exclusive) of the span in km,
/// most specific first.
const ZOOM_STEPS: [(f64, ZoomRange); 5] = [
    (200.0, ZoomRange::new(6, 8)),
    (100.0, ZoomRange::new(8, 10)),
    (50.0, ZoomRange::new(10, 12)),
    (20.0, ZoomRange::new(12, 14)),
    (10.0, ZoomRange::new(14, 16)),
];
const CLOSEST_ZOOM: ZoomRange = ZoomRange::new(16, 18);

/// Two adjacent zoom levels bracketing the expected visual fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn levels(&self) -> Vec<u8> {
        if self.min == self.max {
            vec![self.min]
        } else {
            vec![self.min, self.max]
        }
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        c.lon >= self.min_lon
            && c.lon <= self.max_lon
            && c.lat >= self.min_lat
            && c.lat <= self.max_lat
    }
}

/// Read-only snapshot of a boundary polygon's extent and the view it calls for.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryAnalysis {
    pub bbox: BoundingBox,
    /// Midpoint of the bounding box (not the area centroid).
    pub centroid: Coordinate,
    pub lon_span_deg: f64,
    pub lat_span_deg: f64,
    pub lon_span_km: f64,
    pub lat_span_km: f64,
    pub max_span_km: f64,
    pub point_count: usize,
    pub zoom_range: ZoomRange,
    pub image_size: MapSize,
}

/// Analyze a polygon. Returns `None` when it has fewer than three points.
///
/// Spans use an equirectangular approximation: a degree of latitude is
/// 111 km, a degree of longitude 111 km scaled by cos(centroid latitude).
pub fn analyze(polygon: &Polygon) -> Option<BoundaryAnalysis> {
    if !polygon.is_analyzable() {
        return None;
    }

    let line: LineString<f64> = polygon.into();
    let rect = line.bounding_rect()?;
    let bbox = BoundingBox {
        min_lon: rect.min().x,
        max_lon: rect.max().x,
        min_lat: rect.min().y,
        max_lat: rect.max().y,
    };

    let centroid = bbox.center();
    let lon_span_deg = bbox.lon_span();
    let lat_span_deg = bbox.lat_span();

    let lat_span_km = lat_span_deg * KM_PER_DEGREE;
    let lon_span_km = lon_span_deg * KM_PER_DEGREE * centroid.lat.to_radians().cos();
    let max_span_km = lat_span_km.max(lon_span_km);
    let point_count = polygon.len();

    Some(BoundaryAnalysis {
        bbox,
        centroid,
        lon_span_deg,
        lat_span_deg,
        lon_span_km,
        lat_span_km,
        max_span_km,
        point_count,
        zoom_range: recommend_zoom(max_span_km),
        image_size: recommend_size(max_span_km, point_count),
    })
}

/// Zoom pair for a region whose larger side measures `span_km`.
pub fn recommend_zoom(span_km: f64) -> ZoomRange {
    ZOOM_STEPS
        .iter()
        .find(|(threshold, _)| span_km > *threshold)
        .map(|&(_, range)| range)
        .unwrap_or(CLOSEST_ZOOM)
}

/// Canvas size for a region: large or detailed boundaries get more pixels.
pub fn recommend_size(span_km: f64, point_count: usize) -> MapSize {
    if span_km > 100.0 || point_count > 1000 {
        MapSize::LARGE
    } else if span_km > 20.0 || point_count > 500 {
        MapSize::MEDIUM
    } else {
        MapSize::SMALL
    }
}
