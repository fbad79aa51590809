mod assets;
mod canvas;
mod layers;
mod presenter;
mod renderers;
mod text;

pub use assets::{AssetHandle, AssetKey, AssetKeyError, AssetStore};
pub use canvas::{Canvas, SpriteImage};
pub use layers::{
    apply_lighting, draw_campfire_glow, draw_hold_ring, draw_label, draw_messages, draw_minimap,
    draw_particles, draw_placement_preview, draw_rain, draw_shadow, draw_status, draw_target_hint,
    draw_tiles, tile_color, CLEAR_COLOR,
};
pub use presenter::Presenter;
pub use renderers::{
    fallback_color, EntityDraw, EntityRenderer, PlaceholderRenderer, RendererRegistry,
    SpriteRenderer,
};
pub use text::{draw_text, draw_text_centered, line_height, text_width};
