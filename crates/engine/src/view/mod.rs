mod camera;
mod culling;

pub use camera::{Camera, CameraRig, Viewport};
pub use culling::{
    is_visible, visible_tile_range, CullStrategy, LinearScan, PaddedViewport, TileRange,
    VisibleEntry, VisibleSet,
};
