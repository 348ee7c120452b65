//! Region download pipeline: resolve, analyze, fit, fetch, hand off.

pub mod pacer;

pub use pacer::{CancelFlag, RequestPacer};

use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::{HttpTransport, RegionResolver, StaticMapClient};
use crate::builder::{
    FitOutcome, FitSettings, FittedOverlay, Precision, RequestBuilder, RequestTemplate,
    ViewOverride,
};
use crate::config::{ProviderConfig, validate_zoom_levels};
use crate::domain::{Coordinate, Layers, MapImage, MapRequestParams, MapSize, MapStyle, Region};
use crate::error::MapError;
use crate::geometry::{BoundaryAnalysis, analyze};

/// Canvas used when neither the caller nor a boundary decides the size.
pub const DEFAULT_SIZE: MapSize = MapSize::MEDIUM;

/// What to download for one region.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub region: String,
    /// Explicit zoom levels; `None` follows the recommendation.
    pub zoom_levels: Option<Vec<u8>>,
    pub size: Option<MapSize>,
    pub style: MapStyle,
    pub layers: Layers,
    pub show_boundary: bool,
    pub precision: Precision,
    /// Overrides the precision preset's starting stride.
    pub start_stride: Option<usize>,
    pub mark_center: bool,
}

impl DownloadOptions {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            zoom_levels: None,
            size: None,
            style: MapStyle::default(),
            layers: Layers::default(),
            show_boundary: true,
            precision: Precision::default(),
            start_stride: None,
            mark_center: false,
        }
    }
}

/// A fetched image with the parameters that produced it.
#[derive(Debug, Clone)]
pub struct DownloadedMap {
    pub params: MapRequestParams,
    pub image: MapImage,
}

/// Receives images as they arrive. Writing them anywhere is the sink's job.
pub trait MapSink {
    fn store(&mut self, region: &Region, map: DownloadedMap) -> Result<PathBuf, MapError>;
}

/// Everything decided before the first image request.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub region: Region,
    pub analysis: Option<BoundaryAnalysis>,
    /// `None` when there was no boundary or drawing it was disabled.
    pub fit: Option<FitOutcome>,
    pub requests: Vec<MapRequestParams>,
}

impl DownloadPlan {
    pub fn overlay(&self) -> Option<&FittedOverlay> {
        self.fit.as_ref().and_then(FitOutcome::overlay)
    }
}

#[derive(Debug)]
pub enum LevelStatus {
    Saved(PathBuf),
    Failed(MapError),
    /// Cancelled before the image was stored.
    Skipped,
}

#[derive(Debug)]
pub struct LevelOutcome {
    /// `None` for a provider-fitted view.
    pub zoom: Option<u8>,
    pub status: LevelStatus,
}

/// Per-request results of a batch. A failed level never aborts the rest.
#[derive(Debug)]
pub struct BatchReport {
    pub plan: DownloadPlan,
    pub outcomes: Vec<LevelOutcome>,
}

impl BatchReport {
    pub fn saved(&self) -> impl Iterator<Item = (Option<u8>, &PathBuf)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            LevelStatus::Saved(path) => Some((o.zoom, path)),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (Option<u8>, &MapError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            LevelStatus::Failed(err) => Some((o.zoom, err)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LevelStatus::Skipped))
            .count()
    }
}

/// `markers` value placing a label at `center`.
pub fn center_marker(center: Coordinate) -> String {
    format!("mid,0xFF0000,A:{}", center)
}

/// Sequences resolver, analyzer, request builder and fetcher.
pub struct MapDownloader<R: RegionResolver, T: HttpTransport> {
    resolver: R,
    client: StaticMapClient<T>,
    config: ProviderConfig,
    pacer: RequestPacer,
}

impl<R: RegionResolver, T: HttpTransport> MapDownloader<R, T> {
    pub fn new(resolver: R, client: StaticMapClient<T>, config: ProviderConfig) -> Self {
        let pacer = RequestPacer::new(config.request_delay());
        Self {
            resolver,
            client,
            config,
            pacer,
        }
    }

    /// Resolve and plan, then fetch every planned map.
    pub fn download(
        &self,
        options: &DownloadOptions,
        sink: &mut impl MapSink,
        cancel: &CancelFlag,
    ) -> Result<BatchReport, MapError> {
        let plan = self.prepare(options)?;
        Ok(self.execute(plan, sink, cancel))
    }

    /// Resolve the region and build every request of the batch.
    ///
    /// Only resolver failures and requests that cannot be completed are
    /// errors. A missing boundary or one that cannot be made to fit
    /// degrades to a plain map.
    pub fn prepare(&self, options: &DownloadOptions) -> Result<DownloadPlan, MapError> {
        let zoom_levels = options.zoom_levels.as_deref().filter(|z| !z.is_empty());
        if let Some(levels) = zoom_levels {
            validate_zoom_levels(levels)?;
        }

        let region = self.resolver.resolve(&options.region)?;

        let boundary = region.boundary();
        if boundary.is_none() {
            warn!("{}, drawing a plain map", MapError::NoBoundaryData(region.name.clone()));
        }
        let analysis = boundary.as_ref().and_then(analyze);

        if let Some(a) = &analysis {
            info!(
                points = a.point_count,
                span_km = a.max_span_km,
                zoom = ?(a.zoom_range.min, a.zoom_range.max),
                size = %a.image_size,
                "analyzed boundary"
            );
        }

        let markers = if options.mark_center {
            region
                .center
                .or_else(|| analysis.as_ref().map(|a| a.centroid))
                .map(center_marker)
        } else {
            None
        };

        let template = RequestTemplate {
            size: options
                .size
                .or_else(|| analysis.as_ref().map(|a| a.image_size))
                .unwrap_or(DEFAULT_SIZE),
            scale: self.config.scale,
            style: options.style,
            layers: options.layers,
            markers,
        };

        let point_count = boundary.as_ref().map_or(0, |b| b.len());
        let settings = FitSettings {
            endpoint: self.client.endpoint().to_string(),
            start_stride: options
                .start_stride
                .unwrap_or_else(|| options.precision.start_stride(point_count)),
            max_stride: self.config.max_stride,
            max_url_length: self.config.max_url_length,
            overhead: self.config.url_overhead,
            markers: template.markers.clone(),
        };
        let builder = RequestBuilder::new(settings, template);

        let fit = match &boundary {
            Some(b) if options.show_boundary => Some(builder.fit(b)),
            _ => None,
        };
        let overlay = fit.as_ref().and_then(FitOutcome::overlay);

        let views: Vec<ViewOverride> = match (zoom_levels, overlay, &analysis) {
            (Some(levels), _, _) => levels.iter().copied().map(ViewOverride::zoom).collect(),
            (None, Some(_), _) => vec![ViewOverride::default()],
            (None, None, Some(a)) => a
                .zoom_range
                .levels()
                .into_iter()
                .map(ViewOverride::zoom)
                .collect(),
            (None, None, None) => self
                .config
                .default_zoom_levels
                .iter()
                .copied()
                .map(ViewOverride::zoom)
                .collect(),
        };

        let requests = views
            .into_iter()
            .map(|view| builder.build(overlay, analysis.as_ref(), region.center, view))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DownloadPlan {
            region,
            analysis,
            fit,
            requests,
        })
    }

    /// Fetch each planned request in order, pacing requests and stopping
    /// cleanly on cancellation. Nothing reaches the sink for a failed or
    /// cancelled request.
    pub fn execute(
        &self,
        plan: DownloadPlan,
        sink: &mut impl MapSink,
        cancel: &CancelFlag,
    ) -> BatchReport {
        let mut outcomes = Vec::with_capacity(plan.requests.len());

        for params in &plan.requests {
            let zoom = params.zoom();

            if cancel.is_cancelled() {
                outcomes.push(LevelOutcome {
                    zoom,
                    status: LevelStatus::Skipped,
                });
                continue;
            }

            self.pacer.wait();

            let status = match self.client.fetch(params) {
                Ok(_) if cancel.is_cancelled() => LevelStatus::Skipped,
                Ok(image) => {
                    let size = image.len();
                    let map = DownloadedMap {
                        params: params.clone(),
                        image,
                    };
                    match sink.store(&plan.region, map) {
                        Ok(path) => {
                            info!(?zoom, bytes = size, path = %path.display(), "saved map");
                            LevelStatus::Saved(path)
                        }
                        Err(e) => {
                            warn!(?zoom, %e, "failed to store map");
                            LevelStatus::Failed(e)
                        }
                    }
                }
                Err(e) => {
                    warn!(?zoom, %e, "map download failed");
                    LevelStatus::Failed(e)
                }
            };

            outcomes.push(LevelOutcome { zoom, status });
        }

        BatchReport { plan, outcomes }
    }
}
