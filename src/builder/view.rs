use super::fit::FittedOverlay;
use crate::domain::{Coordinate, Layers, MapRequestParams, MapSize, MapStyle, Viewport};
use crate::error::MapError;
use crate::geometry::BoundaryAnalysis;

/// Request settings shared by every map of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub size: MapSize,
    pub scale: u8,
    pub style: MapStyle,
    pub layers: Layers,
    pub markers: Option<String>,
}

/// Caller-supplied center and zoom.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewOverride {
    pub center: Option<Coordinate>,
    pub zoom: Option<u8>,
}

impl ViewOverride {
    pub fn zoom(zoom: u8) -> Self {
        Self {
            center: None,
            zoom: Some(zoom),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.zoom.is_none()
    }
}

/// Assemble request parameters for one map.
///
/// With an overlay and no override the provider fits the view itself.
/// Otherwise center and zoom are required: the override wins, then the
/// analysis (centroid, lower zoom of the recommended pair), then
/// `fallback_center` for the center.
pub fn build_request(
    template: &RequestTemplate,
    overlay: Option<&FittedOverlay>,
    analysis: Option<&BoundaryAnalysis>,
    fallback_center: Option<Coordinate>,
    view: ViewOverride,
) -> Result<MapRequestParams, MapError> {
    let viewport = match overlay {
        Some(overlay) if view.is_empty() => Viewport::Fit {
            paths: overlay.paths.clone(),
        },
        _ => {
            let center = view
                .center
                .or_else(|| analysis.map(|a| a.centroid))
                .or(fallback_center)
                .ok_or_else(|| MapError::IncompleteRequest("no map center available".into()))?;
            let zoom = view
                .zoom
                .or_else(|| analysis.map(|a| a.zoom_range.min))
                .ok_or_else(|| MapError::IncompleteRequest("no zoom level available".into()))?;

            Viewport::Fixed {
                center,
                zoom,
                paths: overlay.map(|o| o.paths.clone()),
            }
        }
    };

    Ok(MapRequestParams {
        size: template.size,
        scale: template.scale,
        style: template.style,
        layers: template.layers,
        viewport,
        markers: template.markers.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Polygon;
    use crate::geometry::analyze;

    fn template() -> RequestTemplate {
        RequestTemplate {
            size: MapSize::SMALL,
            scale: 2,
            style: MapStyle::Normal,
            layers: Layers::default(),
            markers: None,
        }
    }

    fn overlay() -> FittedOverlay {
        FittedOverlay {
            paths: "8,0x0000FF,1,,:0,0;0.01,0;0.01,0.01;0,0".to_string(),
            stride: 1,
            points: 4,
            original_points: 3,
            estimated_length: 400,
        }
    }

    #[test]
    fn test_overlay_without_override_fits_automatically() {
        let params = build_request(
            &template(),
            Some(&overlay()),
            None,
            None,
            ViewOverride::default(),
        )
        .unwrap();
        assert!(matches!(params.viewport, Viewport::Fit { .. }));
        assert_eq!(params.center(), None);
        assert_eq!(params.zoom(), None);
    }

    #[test]
    fn test_overlay_with_zoom_uses_centroid() {
        let polygon = Polygon::parse("0,0;0.02,0;0.02,0.02;0,0.02");
        let analysis = analyze(&polygon).unwrap();
        let params = build_request(
            &template(),
            Some(&overlay()),
            Some(&analysis),
            Some(Coordinate::new(5.0, 5.0)),
            ViewOverride::zoom(14),
        )
        .unwrap();

        assert_eq!(params.zoom(), Some(14));
        assert_eq!(params.center(), Some(analysis.centroid));
        assert!(params.paths().is_some());
    }

    #[test]
    fn test_no_overlay_uses_recommendation() {
        let polygon = Polygon::parse("0,0;0.02,0;0.02,0.02;0,0.02");
        let analysis = analyze(&polygon).unwrap();
        let params = build_request(
            &template(),
            None,
            Some(&analysis),
            None,
            ViewOverride::default(),
        )
        .unwrap();

        assert_eq!(params.zoom(), Some(analysis.zoom_range.min));
        assert_eq!(params.center(), Some(analysis.centroid));
        assert_eq!(params.paths(), None);
    }

    #[test]
    fn test_no_overlay_no_analysis_needs_zoom() {
        let center = Coordinate::new(114.99, 27.11);
        let err = build_request(&template(), None, None, Some(center), ViewOverride::default());
        assert!(matches!(err, Err(MapError::IncompleteRequest(_))));

        let params =
            build_request(&template(), None, None, Some(center), ViewOverride::zoom(10)).unwrap();
        assert_eq!(params.center(), Some(center));
        assert_eq!(params.zoom(), Some(10));
    }

    #[test]
    fn test_override_center_wins() {
        let polygon = Polygon::parse("0,0;0.02,0;0.02,0.02;0,0.02");
        let analysis = analyze(&polygon).unwrap();
        let center = Coordinate::new(1.0, 1.0);
        let view = ViewOverride {
            center: Some(center),
            zoom: None,
        };
        let params = build_request(&template(), None, Some(&analysis), None, view).unwrap();
        assert_eq!(params.center(), Some(center));
        assert_eq!(params.zoom(), Some(16));
    }
}
