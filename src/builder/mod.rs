//! Turns a boundary analysis into provider requests that respect the URL
//! length ceiling.

pub mod fit;
pub mod overlay;
pub mod view;

pub use fit::{FitOutcome, FitSettings, FittedOverlay, MIN_OVERLAY_POINTS, Precision, fit_overlay};
pub use overlay::PathStyle;
pub use view::{RequestTemplate, ViewOverride, build_request};

use tracing::warn;

use crate::domain::{Coordinate, MapRequestParams, Polygon};
use crate::error::MapError;
use crate::geometry::BoundaryAnalysis;

/// Fits the boundary overlay once and builds one request per view.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    settings: FitSettings,
    style: PathStyle,
    template: RequestTemplate,
}

impl RequestBuilder {
    pub fn new(settings: FitSettings, template: RequestTemplate) -> Self {
        Self {
            settings,
            style: PathStyle::default(),
            template,
        }
    }

    pub fn settings(&self) -> &FitSettings {
        &self.settings
    }

    /// Run the adaptive simplification loop. Exhaustion is logged and
    /// reported, never an error: the caller falls back to a plain map.
    pub fn fit(&self, polygon: &Polygon) -> FitOutcome {
        let outcome = fit_overlay(polygon, &self.style, &self.settings);
        if let FitOutcome::Exhausted { last_stride } = outcome {
            warn!(
                points = polygon.len(),
                last_stride,
                ceiling = self.settings.max_url_length,
                "boundary does not fit the request limit, drawing map without it"
            );
        }
        outcome
    }

    /// Build request parameters for one view, reusing a fitted overlay.
    pub fn build(
        &self,
        overlay: Option<&FittedOverlay>,
        analysis: Option<&BoundaryAnalysis>,
        fallback_center: Option<Coordinate>,
        view: ViewOverride,
    ) -> Result<MapRequestParams, MapError> {
        build_request(&self.template, overlay, analysis, fallback_center, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Layers, MapSize, MapStyle};
    use crate::geometry::analyze;

    fn builder(max_stride: usize, max_url_length: usize) -> RequestBuilder {
        RequestBuilder::new(
            FitSettings {
                endpoint: "https://restapi.amap.com/v3/staticmap".to_string(),
                start_stride: 1,
                max_stride,
                max_url_length,
                overhead: 256,
                markers: Some("mid,0xFF0000,A:115,27".to_string()),
            },
            RequestTemplate {
                size: MapSize::MEDIUM,
                scale: 2,
                style: MapStyle::Normal,
                layers: Layers {
                    traffic: true,
                    labels: false,
                },
                markers: Some("mid,0xFF0000,A:115,27".to_string()),
            },
        )
    }

    fn dense_ring(n: usize) -> Polygon {
        let points = (0..n)
            .map(|i| {
                let angle = i as f64 / n as f64 * std::f64::consts::TAU;
                Coordinate::new(115.0 + angle.cos() * 0.3, 27.0 + angle.sin() * 0.3)
            })
            .collect();
        Polygon::new(points)
    }

    fn serialized_length(b: &RequestBuilder, params: &MapRequestParams) -> usize {
        let key = "0123456789abcdef0123456789abcdef";
        url::Url::parse_with_params(&b.settings().endpoint, params.to_query(key))
            .unwrap()
            .as_str()
            .len()
    }

    #[test]
    fn test_accepted_request_never_exceeds_ceiling() {
        let polygon = dense_ring(5000);
        let analysis = analyze(&polygon).unwrap();
        for ceiling in [1500, 3000, 6000, 8000, 12_000] {
            let b = builder(100, ceiling);
            let outcome = b.fit(&polygon);

            for view in [ViewOverride::default(), ViewOverride::zoom(12)] {
                let params = b
                    .build(outcome.overlay(), Some(&analysis), None, view)
                    .unwrap();

                match params.paths() {
                    Some(_) => {
                        let estimate = params
                            .estimated_length(&b.settings().endpoint, b.settings().overhead);
                        assert!(estimate <= ceiling);
                        assert!(serialized_length(&b, &params) <= ceiling);
                    }
                    None => {
                        assert!(params.center().is_some());
                        assert!(params.zoom().is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn test_dense_ring_fits_default_ceiling_once_encoded() {
        let polygon = dense_ring(3000);
        let b = builder(64, 8000);
        let outcome = b.fit(&polygon);
        let overlay = outcome.overlay().unwrap();

        let params = b
            .build(Some(overlay), None, None, ViewOverride::default())
            .unwrap();
        assert_eq!(
            overlay.estimated_length,
            params.estimated_length(&b.settings().endpoint, 256)
        );
        assert!(serialized_length(&b, &params) <= 8000);
    }

    #[test]
    fn test_overlay_reused_across_zoom_levels() {
        let polygon = dense_ring(300);
        let b = builder(50, 8000);
        let analysis = analyze(&polygon).unwrap();
        let outcome = b.fit(&polygon);
        let overlay = outcome.overlay().unwrap();

        let requests: Vec<_> = [10, 12, 14]
            .into_iter()
            .map(|z| {
                b.build(Some(overlay), Some(&analysis), None, ViewOverride::zoom(z))
                    .unwrap()
            })
            .collect();

        for (params, zoom) in requests.iter().zip([10, 12, 14]) {
            assert_eq!(params.zoom(), Some(zoom));
            assert_eq!(params.paths(), Some(overlay.paths.as_str()));
        }
    }
}
