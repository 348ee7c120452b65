use super::coordinate::{Coordinate, Polygon};

/// An administrative region as returned by the resolver.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Administrative division code (e.g. "360802").
    pub adcode: String,
    pub level: Option<String>,
    /// Administrative center published by the provider.
    pub center: Option<Coordinate>,
    /// Raw polyline text; `None` when the provider has no boundary.
    pub polyline: Option<String>,
}

impl Region {
    /// Parsed boundary, or `None` when there is no usable polygon.
    pub fn boundary(&self) -> Option<Polygon> {
        let text = self.polyline.as_deref()?;
        let polygon = Polygon::parse(text);
        polygon.is_analyzable().then_some(polygon)
    }
}
