use crate::frame::{Message, Particle};
use crate::interaction::{InteractionCategory, PlaceableItem};
use crate::lighting::{DarknessOverlay, LightMask};
use crate::view::{visible_tile_range, Camera};
use crate::world::{EntityKind, TileKind, Tilemap, Vec2, WorldSnapshot};

use super::text::{draw_text, draw_text_centered, line_height, text_width};
use super::Canvas;

pub const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 90];
const LABEL_COLOR: [u8; 4] = [244, 248, 252, 255];
const HINT_COLOR: [u8; 4] = [255, 210, 70, 255];
const HOLD_RING_TRACK_COLOR: [u8; 4] = [10, 12, 16, 150];
const HOLD_RING_COLOR: [u8; 4] = [255, 236, 120, 255];
const HOLD_RING_RADIUS_PX: i32 = 14;
const HOLD_RING_THICKNESS_PX: i32 = 3;
const PREVIEW_VALID_COLOR: [u8; 4] = [110, 230, 130, 110];
const PREVIEW_INVALID_COLOR: [u8; 4] = [240, 90, 80, 110];
const GLOW_RGB: [u8; 3] = [110, 60, 18];
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const TEXT_SCALE: i32 = 2;
const LABEL_SCALE: i32 = 1;
const MESSAGE_MARGIN_PX: i32 = 12;
const MINIMAP_SIZE_PX: i32 = 160;
const MINIMAP_MARGIN_PX: i32 = 12;
const RAIN_COLOR: [u8; 4] = [170, 190, 220, 120];
const RAIN_STREAKS_AT_FULL_INTENSITY: u32 = 220;
const RAIN_FALL_PX_PER_SECOND: f32 = 900.0;

pub fn tile_color(tile: TileKind) -> [u8; 4] {
    match tile {
        TileKind::Grass => [74, 112, 56, 255],
        TileKind::Dirt => [112, 83, 58, 255],
        TileKind::Sand => [196, 178, 122, 255],
        TileKind::Water => [46, 88, 140, 255],
        TileKind::Rock => [96, 96, 100, 255],
    }
}

/// Fills only the tiles overlapping the viewport.
pub fn draw_tiles(canvas: &mut Canvas<'_>, tilemap: &Tilemap, camera: &Camera) {
    let Some(range) = visible_tile_range(tilemap, camera) else {
        return;
    };
    let size = tilemap.tile_size();
    let tile_px = size.ceil() as i32;
    for y in range.y_min..=range.y_max {
        for x in range.x_min..=range.x_max {
            let (Some(tile), Some(origin)) = (tilemap.tile_at(x, y), tilemap.tile_origin_world(x, y)) else {
                continue;
            };
            let Some((sx, sy)) = camera.world_to_pixel(origin) else {
                continue;
            };
            canvas.fill_rect(sx, sy, tile_px, tile_px, tile_color(tile));
        }
    }
}

pub fn draw_shadow(canvas: &mut Canvas<'_>, ground: (i32, i32), radius: i32, scale: f32) {
    if radius <= 0 {
        return;
    }
    let scale = if scale.is_finite() { scale.clamp(0.1, 1.0) } else { 1.0 };
    let radius_x = ((radius as f32) * scale).round() as i32;
    let radius_y = (radius_x / 2).max(1);
    canvas.fill_ellipse(ground.0, ground.1 + radius_y, radius_x, radius_y, SHADOW_COLOR);
}

pub fn draw_particles(canvas: &mut Canvas<'_>, particles: &[Particle], camera: &Camera) {
    for particle in particles {
        let Some((x, y)) = camera.world_to_pixel(particle.position) else {
            continue;
        };
        let size = particle.size.round().max(1.0) as i32;
        if size <= 1 {
            canvas.blend(x, y, particle.color());
        } else {
            canvas.fill_circle(x, y, size / 2, particle.color());
        }
    }
}

/// Name tag centred above an entity.
pub fn draw_label(canvas: &mut Canvas<'_>, anchor: (i32, i32), text: &str) {
    if text.is_empty() {
        return;
    }
    let top = anchor.1 - line_height(LABEL_SCALE);
    draw_text_centered(canvas, anchor.0, top, text, LABEL_SCALE, LABEL_COLOR);
}

/// Key hint below the closest interactable.
pub fn draw_target_hint(canvas: &mut Canvas<'_>, anchor: (i32, i32), category: InteractionCategory) {
    let text = format!("E: {}", category.hint_label());
    draw_text_centered(canvas, anchor.0, anchor.1 + 14, &text, LABEL_SCALE, HINT_COLOR);
}

pub fn draw_placement_preview(canvas: &mut Canvas<'_>, center: (i32, i32), item: PlaceableItem, valid: bool) {
    let half = item.footprint_half_px();
    let color = if valid {
        PREVIEW_VALID_COLOR
    } else {
        PREVIEW_INVALID_COLOR
    };
    canvas.fill_rect(center.0 - half, center.1 - half, half * 2, half * 2, color);
    canvas.rect_outline(
        center.0 - half,
        center.1 - half,
        half * 2,
        half * 2,
        [color[0], color[1], color[2], 255],
    );
}

/// Darkens every pixel by its mask coverage. A mask of the wrong size leaves the frame untouched.
pub fn apply_lighting(canvas: &mut Canvas<'_>, overlay: DarknessOverlay, mask: &LightMask) {
    if overlay.alpha <= 0.0 || mask.width() != canvas.width() || mask.height() != canvas.height() {
        return;
    }
    let [r, g, b] = overlay.color;
    let width = mask.width() as usize;
    for (index, coverage) in mask.alpha().iter().enumerate() {
        if *coverage == 0 {
            continue;
        }
        let x = (index % width) as i32;
        let y = (index / width) as i32;
        canvas.blend(x, y, [r, g, b, *coverage]);
    }
}

pub fn draw_hold_ring(canvas: &mut Canvas<'_>, center: (i32, i32), fraction: f32) {
    canvas.ring_arc(
        center.0,
        center.1,
        HOLD_RING_RADIUS_PX,
        HOLD_RING_THICKNESS_PX,
        1.0,
        HOLD_RING_TRACK_COLOR,
    );
    canvas.ring_arc(
        center.0,
        center.1,
        HOLD_RING_RADIUS_PX,
        HOLD_RING_THICKNESS_PX,
        fraction,
        HOLD_RING_COLOR,
    );
}

/// Additive warm glow over a burning fire, applied after the darkness pass.
pub fn draw_campfire_glow(canvas: &mut Canvas<'_>, center: (i32, i32), radius: i32, strength: f32) {
    canvas.glow(center.0, center.1, radius, GLOW_RGB, strength);
}

/// Stack of transient messages at the bottom centre, newest lowest.
pub fn draw_messages<'m>(canvas: &mut Canvas<'_>, messages: impl Iterator<Item = &'m Message>) {
    let messages: Vec<&Message> = messages.collect();
    if messages.is_empty() {
        return;
    }
    let center_x = canvas.width() as i32 / 2;
    let step = line_height(TEXT_SCALE) + 4;
    let mut y = canvas.height() as i32 - MESSAGE_MARGIN_PX - step * messages.len() as i32;
    for message in messages {
        let text = message.text.to_uppercase();
        let width = text_width(&text, TEXT_SCALE);
        canvas.fill_rect(
            center_x - width / 2 - 6,
            y - 4,
            width + 12,
            line_height(TEXT_SCALE) + 2,
            PANEL_BG_COLOR,
        );
        draw_text_centered(canvas, center_x, y, &text, TEXT_SCALE, LABEL_COLOR);
        y += step;
    }
}

/// Small status line in the top-left corner.
pub fn draw_status(canvas: &mut Canvas<'_>, lines: &[String]) {
    let mut y = MESSAGE_MARGIN_PX;
    for line in lines {
        draw_text(canvas, MESSAGE_MARGIN_PX, y, line, TEXT_SCALE, LABEL_COLOR);
        y += line_height(TEXT_SCALE);
    }
}

/// Downsampled tilemap plus dots for actors and burning fires, top-right corner.
pub fn draw_minimap(canvas: &mut Canvas<'_>, snapshot: &WorldSnapshot, camera: &Camera) {
    let Some(tilemap) = &snapshot.tilemap else {
        return;
    };
    let world = tilemap.world_size();
    if !(world.x > 0.0 && world.y > 0.0) {
        return;
    }
    let size = MINIMAP_SIZE_PX.min(canvas.width() as i32 - 2 * MINIMAP_MARGIN_PX);
    if size <= 4 {
        return;
    }
    let left = canvas.width() as i32 - MINIMAP_MARGIN_PX - size;
    let top = MINIMAP_MARGIN_PX;
    canvas.fill_rect(left - 2, top - 2, size + 4, size + 4, PANEL_BG_COLOR);

    let origin = tilemap.origin();
    let to_world = |px: i32, py: i32| {
        Vec2::new(
            origin.x + (px as f32 + 0.5) / size as f32 * world.x,
            origin.y + (py as f32 + 0.5) / size as f32 * world.y,
        )
    };
    for py in 0..size {
        for px in 0..size {
            if let Some(tile) = tilemap.tile_at_world(to_world(px, py)) {
                canvas.put(left + px, top + py, tile_color(tile));
            }
        }
    }

    let to_minimap = |position: Vec2| -> Option<(i32, i32)> {
        if !position.is_finite() {
            return None;
        }
        let u = (position.x - origin.x) / world.x;
        let v = (position.y - origin.y) / world.y;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some((left + (u * (size - 1) as f32) as i32, top + (v * (size - 1) as f32) as i32))
    };
    for entity in snapshot.entities() {
        let color = match entity.kind {
            EntityKind::Player if Some(entity.id) == snapshot.local_player => [255, 255, 255, 255],
            EntityKind::Player => [90, 160, 255, 255],
            EntityKind::Creature => [230, 80, 70, 255],
            EntityKind::Campfire if entity.is_burning() => [255, 170, 60, 255],
            _ => continue,
        };
        if let Some((x, y)) = to_minimap(entity.position) {
            canvas.fill_rect(x - 1, y - 1, 3, 3, color);
        }
    }

    // Viewport frame.
    let view_top_left = to_minimap(camera.screen_to_world(Vec2::ZERO));
    let view_bottom_right = to_minimap(camera.screen_to_world(Vec2::new(
        camera.viewport.width as f32,
        camera.viewport.height as f32,
    )));
    if let (Some((x0, y0)), Some((x1, y1))) = (view_top_left, view_bottom_right) {
        canvas.rect_outline(x0, y0, x1 - x0 + 1, y1 - y0 + 1, PANEL_BORDER_COLOR);
    }
    canvas.rect_outline(left - 2, top - 2, size + 4, size + 4, PANEL_BORDER_COLOR);
}

/// Stateless rain: streak positions are a pure function of index and time.
pub fn draw_rain(canvas: &mut Canvas<'_>, intensity: f32, now_ms: u64) {
    if !(intensity > 0.0) {
        return;
    }
    let width = canvas.width();
    let height = canvas.height();
    if width == 0 || height == 0 {
        return;
    }
    let streaks = (RAIN_STREAKS_AT_FULL_INTENSITY as f32 * intensity.min(1.0)).round() as u32;
    let fall = now_ms as f32 / 1_000.0 * RAIN_FALL_PX_PER_SECOND;
    for index in 0..streaks {
        let seed = hash_u32(index);
        let x = (seed % width) as f32;
        let phase = (hash_u32(seed) % height) as f32;
        let y = (phase + fall * (0.8 + (seed % 5) as f32 * 0.1)) % height as f32;
        let length = 8 + (seed % 7) as i32;
        let from = (x as i32, y as i32);
        let to = (x as i32 - length / 3, y as i32 + length);
        canvas.line(from, to, RAIN_COLOR);
    }
}

fn hash_u32(value: u32) -> u32 {
    let mut x = value.wrapping_mul(0x9E37_79B9).wrapping_add(0x7F4A_7C15);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x
}
