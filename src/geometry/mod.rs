pub mod analysis;
pub mod simplify;

pub use analysis::{
    BoundaryAnalysis, BoundingBox, ZoomRange, analyze, recommend_size, recommend_zoom,
};
pub use simplify::{SimplificationResult, simplify, stride_for_target};
