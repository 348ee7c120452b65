pub mod coordinate;
pub mod region;
pub mod request;

pub use coordinate::{Coordinate, Polygon};
pub use region::Region;
pub use request::{
    Layers, MAX_ZOOM, MIN_ZOOM, MapImage, MapRequestParams, MapSize, MapStyle, Viewport,
    request_length, zoom_label,
};
