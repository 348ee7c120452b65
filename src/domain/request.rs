use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

use super::coordinate::Coordinate;

/// Zoom levels accepted by the static map endpoint.
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 18;

/// Length of the request URL as sent: the endpoint, `?`, and the
/// form-urlencoded `paths` and `markers` pairs, plus `overhead` for the
/// remaining short parameters and their separators.
pub fn request_length(
    endpoint: &str,
    paths: Option<&str>,
    markers: Option<&str>,
    overhead: usize,
) -> usize {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(paths) = paths {
        serializer.append_pair("paths", paths);
    }
    if let Some(markers) = markers {
        serializer.append_pair("markers", markers);
    }
    endpoint.len() + 1 + serializer.finish().len() + overhead
}

/// Coarse description of what a zoom level shows, used in file names.
pub fn zoom_label(zoom: u8) -> &'static str {
    match zoom {
        0..=3 => "country",
        4..=5 => "province",
        6..=8 => "city",
        9..=11 => "county",
        12..=13 => "township",
        14 => "village",
        15..=16 => "street",
        _ => "building",
    }
}

/// Output canvas in pixels (before the resolution scale is applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl MapSize {
    pub const SMALL: MapSize = MapSize::square(512);
    pub const MEDIUM: MapSize = MapSize::square(1024);
    pub const LARGE: MapSize = MapSize::square(2048);

    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

impl fmt::Display for MapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.width, self.height)
    }
}

impl FromStr for MapSize {
    type Err = String;

    /// Accepts `"W*H"` or `"WxH"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('*')
            .or_else(|| s.split_once(['x', 'X']))
            .ok_or_else(|| format!("invalid map size '{}', expected W*H", s))?;

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid map width '{}'", w))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid map height '{}'", h))?;

        if width == 0 || height == 0 {
            return Err(format!("map size must be non-zero, got '{}'", s));
        }

        Ok(Self { width, height })
    }
}

impl<'de> Deserialize<'de> for MapSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Base map style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    #[default]
    Normal,
    Satellite,
    Roadmap,
}

impl MapStyle {
    pub fn maptype(self) -> &'static str {
        match self {
            MapStyle::Normal => "normal",
            MapStyle::Satellite => "satellite",
            MapStyle::Roadmap => "roadmap",
        }
    }
}

/// Optional layers drawn on top of the base map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    pub traffic: bool,
    pub labels: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            traffic: false,
            labels: true,
        }
    }
}

impl Layers {
    /// Provider `layers` value, or `None` when nothing needs to be sent.
    /// Satellite imagery carries no labels, so `nolabel` is skipped there.
    pub fn param(&self, style: MapStyle) -> Option<String> {
        let mut layers = Vec::new();
        if self.traffic {
            layers.push("traffic");
        }
        if !self.labels && style != MapStyle::Satellite {
            layers.push("nolabel");
        }

        (!layers.is_empty()).then(|| layers.join(","))
    }
}

/// How the provider chooses the visible area.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    /// No center or zoom: the provider fits the view around the overlay.
    Fit { paths: String },
    /// Explicit center and zoom, with or without an overlay.
    Fixed {
        center: Coordinate,
        zoom: u8,
        paths: Option<String>,
    },
}

/// Parameters of a single static map request.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequestParams {
    pub size: MapSize,
    pub scale: u8,
    pub style: MapStyle,
    pub layers: Layers,
    pub viewport: Viewport,
    pub markers: Option<String>,
}

impl MapRequestParams {
    pub fn paths(&self) -> Option<&str> {
        match &self.viewport {
            Viewport::Fit { paths } => Some(paths),
            Viewport::Fixed { paths, .. } => paths.as_deref(),
        }
    }

    pub fn center(&self) -> Option<Coordinate> {
        match self.viewport {
            Viewport::Fit { .. } => None,
            Viewport::Fixed { center, .. } => Some(center),
        }
    }

    pub fn zoom(&self) -> Option<u8> {
        match self.viewport {
            Viewport::Fit { .. } => None,
            Viewport::Fixed { zoom, .. } => Some(zoom),
        }
    }

    /// Estimated length of the full request URL, see [`request_length`].
    pub fn estimated_length(&self, endpoint: &str, overhead: usize) -> usize {
        request_length(endpoint, self.paths(), self.markers.as_deref(), overhead)
    }

    /// Query pairs in the provider's parameter names.
    pub fn to_query(&self, key: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("key", key.to_string()),
            ("size", self.size.to_string()),
            ("scale", self.scale.to_string()),
            ("format", "png".to_string()),
            ("maptype", self.style.maptype().to_string()),
        ];

        if let Some(layers) = self.layers.param(self.style) {
            query.push(("layers", layers));
        }

        if let Viewport::Fixed { center, zoom, .. } = &self.viewport {
            query.push(("location", center.to_string()));
            query.push(("zoom", zoom.to_string()));
        }

        if let Some(paths) = self.paths() {
            query.push(("paths", paths.to_string()));
        }

        if let Some(markers) = &self.markers {
            query.push(("markers", markers.clone()));
        }

        query
    }
}

/// Image payload returned by the provider.
#[derive(Debug, Clone)]
pub struct MapImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MapImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
