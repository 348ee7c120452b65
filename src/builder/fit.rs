use serde::Deserialize;
use tracing::debug;

use super::overlay::PathStyle;
use crate::domain::{Polygon, request_length};
use crate::geometry::{simplify, stride_for_target};

/// Fewest points an overlay may keep: a closed triangle.
pub const MIN_OVERLAY_POINTS: usize = 4;

/// Starting point of the simplification loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Every other point, unless that would leave too few to draw
    #[default]
    Alternate,
    /// About 500 points
    High,
    /// About 1000 points
    Ultra,
}

impl Precision {
    pub fn start_stride(self, point_count: usize) -> usize {
        match self {
            Precision::Alternate if point_count >= 2 * MIN_OVERLAY_POINTS => 2,
            Precision::Alternate => 1,
            Precision::High => stride_for_target(point_count, 500),
            Precision::Ultra => stride_for_target(point_count, 1000),
        }
    }
}

/// Limits for fitting an overlay into one request.
#[derive(Debug, Clone)]
pub struct FitSettings {
    /// Endpoint URL counted against the ceiling.
    pub endpoint: String,
    pub start_stride: usize,
    pub max_stride: usize,
    /// Provider URL length ceiling.
    pub max_url_length: usize,
    /// Allowance for the short non-overlay parameters.
    pub overhead: usize,
    /// Markers sent along with the overlay.
    pub markers: Option<String>,
}

impl FitSettings {
    /// Same estimate the fetcher checks before sending.
    pub fn estimate_length(&self, overlay: &str) -> usize {
        request_length(
            &self.endpoint,
            Some(overlay),
            self.markers.as_deref(),
            self.overhead,
        )
    }
}

/// An encoded overlay that fits under the ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedOverlay {
    pub paths: String,
    pub stride: usize,
    pub points: usize,
    pub original_points: usize,
    pub estimated_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted(FittedOverlay),
    /// No stride up to the maximum produced a usable overlay that fits.
    Exhausted { last_stride: usize },
}

impl FitOutcome {
    pub fn overlay(&self) -> Option<&FittedOverlay> {
        match self {
            FitOutcome::Fitted(overlay) => Some(overlay),
            FitOutcome::Exhausted { .. } => None,
        }
    }
}

/// Raise the stride one step at a time until the encoded boundary fits.
///
/// Terminates after at most `max_stride - start_stride + 1` attempts, or
/// earlier once decimation leaves fewer than [`MIN_OVERLAY_POINTS`] points
/// (larger strides can only keep fewer).
pub fn fit_overlay(polygon: &Polygon, style: &PathStyle, settings: &FitSettings) -> FitOutcome {
    let start = settings.start_stride.max(1);
    let mut last_stride = start;

    for stride in start..=settings.max_stride {
        last_stride = stride;

        let simplified = simplify(polygon, stride);
        if simplified.polygon.len() < MIN_OVERLAY_POINTS {
            debug!(stride, points = simplified.polygon.len(), "overlay degenerated");
            break;
        }

        let paths = style.encode(&simplified.polygon);
        let estimated_length = settings.estimate_length(&paths);

        if estimated_length <= settings.max_url_length {
            debug!(
                stride,
                points = simplified.polygon.len(),
                estimated_length,
                "overlay fits"
            );
            return FitOutcome::Fitted(FittedOverlay {
                points: simplified.polygon.len(),
                original_points: polygon.len(),
                paths,
                stride,
                estimated_length,
            });
        }

        debug!(
            stride,
            estimated_length,
            ceiling = settings.max_url_length,
            "overlay too long"
        );
    }

    FitOutcome::Exhausted { last_stride }
}
