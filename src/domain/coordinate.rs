use std::fmt;

/// A WGS84 position in degrees, longitude first as the provider writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Parse a `"lon,lat"` token. Returns `None` for anything malformed or
    /// out of range.
    pub fn parse(token: &str) -> Option<Self> {
        let (lon, lat) = token.trim().split_once(',')?;
        let lon: f64 = lon.trim().parse().ok()?;
        let lat: f64 = lat.trim().parse().ok()?;

        let coord = Self::new(lon, lat);
        coord.is_valid().then_some(coord)
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::coord! { x: c.lon, y: c.lat }
    }
}

/// An ordered ring of coordinates describing a region outline.
///
/// Parsed once from provider text and never mutated afterwards; the
/// simplifier produces new polygons instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    points: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Parse provider polyline text `"lon,lat;lon,lat;..."`.
    ///
    /// Malformed tokens are dropped. Text holding several rings separated by
    /// `|` yields the ring with the most valid points.
    pub fn parse(text: &str) -> Self {
        text.split('|')
            .map(|ring| {
                ring.split(';')
                    .filter_map(Coordinate::parse)
                    .collect::<Vec<_>>()
            })
            .max_by_key(Vec::len)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least three points are needed to describe an area.
    pub fn is_analyzable(&self) -> bool {
        self.points.len() >= 3
    }

    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    /// Serialize back to `"lon,lat;lon,lat;..."`.
    pub fn to_path_string(&self) -> String {
        self.points
            .iter()
            .map(Coordinate::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl From<&Polygon> for geo::LineString<f64> {
    fn from(polygon: &Polygon) -> Self {
        polygon.points.iter().map(|&c| geo::Coord::from(c)).collect()
    }
}
