use rand::Rng;

use crate::config::LightingConfig;
use crate::world::{EntityKind, Vec2, WorldSnapshot};

use super::schedule::DayNightSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Campfire,
    Torch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub position: Vec2,
    pub radius: f32,
    pub flicker: bool,
}

/// Burning campfires and every living actor carrying a lit torch.
pub fn collect_light_sources(snapshot: &WorldSnapshot, config: &LightingConfig) -> Vec<LightSource> {
    let mut lights = Vec::new();
    if let Some(fires) = snapshot.collection(EntityKind::Campfire) {
        lights.extend(
            fires
                .values()
                .filter(|entity| entity.is_burning() && entity.position.is_finite())
                .map(|entity| LightSource {
                    kind: LightKind::Campfire,
                    position: entity.position,
                    radius: config.campfire_radius_px,
                    flicker: true,
                }),
        );
    }
    for kind in [EntityKind::Player, EntityKind::Creature] {
        let Some(actors) = snapshot.collection(kind) else {
            continue;
        };
        lights.extend(
            actors
                .values()
                .filter(|entity| entity.has_lit_torch() && entity.position.is_finite())
                .map(|entity| LightSource {
                    kind: LightKind::Torch,
                    position: entity.position,
                    radius: config.torch_radius_px,
                    flicker: true,
                }),
        );
    }
    lights
}

/// Per-pixel darkness coverage, 0 = fully lit, 255 = full darkness color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl LightMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.alpha
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn reset(&mut self, width: u32, height: u32, value: u8) {
        self.width = width;
        self.height = height;
        self.alpha.clear();
        self.alpha.resize(width as usize * height as usize, value);
    }

    fn clear_radial(&mut self, center: Vec2, radius: f32, dark: u8) {
        if self.width == 0 || self.height == 0 || radius <= 0.0 || !center.is_finite() {
            return;
        }
        let min_x = (center.x - radius).floor().max(0.0) as i64;
        let min_y = (center.y - radius).floor().max(0.0) as i64;
        let max_x = (center.x + radius).ceil().min(self.width as f32 - 1.0) as i64;
        let max_y = (center.y + radius).ceil().min(self.height as f32 - 1.0) as i64;
        if max_x < min_x || max_y < min_y {
            return;
        }

        let width = self.width as usize;
        let radius_sq = radius * radius;
        for py in min_y..=max_y {
            let dy = py as f32 + 0.5 - center.y;
            for px in min_x..=max_x {
                let dx = px as f32 + 0.5 - center.x;
                let distance_sq = dx * dx + dy * dy;
                if distance_sq >= radius_sq {
                    continue;
                }
                let falloff = distance_sq.sqrt() / radius;
                let value = (dark as f32 * falloff).round() as u8;
                let index = py as usize * width + px as usize;
                if let Some(slot) = self.alpha.get_mut(index) {
                    *slot = (*slot).min(value);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarknessOverlay {
    pub color: [u8; 3],
    pub alpha: f32,
}

/// Rebuilds the darkness mask every frame. The mask buffer is reused for its
/// allocation only; no value survives from one `compose` call to the next.
#[derive(Debug, Default)]
pub struct LightingCompositor {
    mask: LightMask,
}

impl LightingCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(schedule: &DayNightSchedule, night_color: [u8; 3], progress: Option<f32>) -> DarknessOverlay {
        DarknessOverlay {
            color: night_color,
            alpha: schedule.darkness_alpha(progress),
        }
    }

    /// `camera_offset` maps world to screen (`screen = world + offset`).
    /// `rng` drives flicker jitter only.
    pub fn compose<R: Rng>(
        &mut self,
        config: &LightingConfig,
        progress: Option<f32>,
        lights: &[LightSource],
        camera_offset: Vec2,
        viewport: (u32, u32),
        rng: &mut R,
    ) -> (DarknessOverlay, &LightMask) {
        let overlay = Self::overlay(&config.schedule, config.night_color, progress);
        let dark = (overlay.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (width, height) = viewport;
        self.mask.reset(width, height, dark);
        if dark == 0 {
            return (overlay, &self.mask);
        }

        let jitter = if config.flicker_jitter_px.is_finite() {
            config.flicker_jitter_px.max(0.0)
        } else {
            0.0
        };
        for light in lights {
            let mut radius = light.radius;
            if light.flicker && jitter > 0.0 {
                radius += rng.gen_range(-jitter..=jitter);
            }
            let center = light.position + camera_offset;
            if !circle_touches_viewport(center, radius, width, height) {
                continue;
            }
            self.mask.clear_radial(center, radius, dark);
        }
        (overlay, &self.mask)
    }

    pub fn mask(&self) -> &LightMask {
        &self.mask
    }
}

/// Whether a screen-space circle overlaps a `width` by `height` viewport.
pub fn circle_touches_viewport(center: Vec2, radius: f32, width: u32, height: u32) -> bool {
    if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return false;
    }
    center.x + radius >= 0.0
        && center.y + radius >= 0.0
        && center.x - radius <= width as f32
        && center.y - radius <= height as f32
}
