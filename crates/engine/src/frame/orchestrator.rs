use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::app::rendering::{
    apply_lighting, draw_campfire_glow, draw_hold_ring, draw_label, draw_messages, draw_minimap,
    draw_particles, draw_placement_preview, draw_rain, draw_shadow, draw_status, draw_target_hint,
    draw_tiles, AssetStore, Canvas, EntityDraw, RendererRegistry, CLEAR_COLOR,
};
use crate::app::InputEvent;
use crate::config::{ConfigError, CoreConfig};
use crate::interaction::{
    check_placement, IntentSink, InteractionMachine, InteractionTargets, TickInput, UiMode,
};
use crate::lighting::{circle_touches_viewport, collect_light_sources, LightKind, LightingCompositor};
use crate::view::{Camera, CameraRig, CullStrategy, LinearScan, Viewport, VisibleSet};
use crate::world::{Entity, EntityId, EntityKind, Vec2, Weather, WorldSnapshot};

use super::animation::AnimationState;
use super::messages::MessageLog;
use super::particles::ParticleSystem;
use super::timing::{FrameClock, FrameDelta, RenderPacer};

const FLICKER_SEED_SALT: u64 = 0x5eed_f1a3;
const HOLD_RING_LIFT_PX: i32 = 26;
const CAMPFIRE_GLOW_RADIUS_PX: i32 = 40;
const CAMPFIRE_GLOW_STRENGTH: f32 = 0.55;

/// Static ground kinds, drawn in this order beneath the y-sorted actors.
const GROUND_KINDS: [EntityKind; 7] = [
    EntityKind::Structure,
    EntityKind::Corpse,
    EntityKind::Stash,
    EntityKind::Container,
    EntityKind::Plant,
    EntityKind::Campfire,
    EntityKind::DroppedItem,
];

const DYNAMIC_KINDS: [EntityKind; 2] = [EntityKind::Player, EntityKind::Creature];

/// Draw passes in the order they hit the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    World,
    Shadows,
    GroundItems,
    Entities,
    Particles,
    Labels,
    PlacementPreview,
    Lighting,
    Indicators,
    Minimap,
    Weather,
}

/// Per-frame inputs owned by the external layers. Read-only here.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub now_ms: u64,
    pub snapshot: &'a WorldSnapshot,
    pub targets: &'a InteractionTargets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub delta: FrameDelta,
    /// False when the pacer skipped the draw; state still advanced.
    pub drew: bool,
    pub layers: Vec<RenderLayer>,
    pub visible_count: usize,
    pub particle_count: usize,
    pub camera_offset: Vec2,
    /// Actor ids in the order the y-sorted pass drew them.
    pub actor_draw_order: Vec<EntityId>,
}

/// Everything the client keeps between frames, in one place. Created at
/// session start and dropped at session end.
pub struct FrameContext {
    config: CoreConfig,
    clock: FrameClock,
    pacer: RenderPacer,
    camera_rig: CameraRig,
    camera: Option<Camera>,
    culler: Box<dyn CullStrategy>,
    visible: VisibleSet,
    lighting: LightingCompositor,
    flicker_rng: StdRng,
    particles: ParticleSystem,
    animation: AnimationState,
    interaction: InteractionMachine,
    messages: MessageLog,
    renderers: RendererRegistry,
    assets: AssetStore,
    actor_order: Vec<(f32, EntityId)>,
}

impl FrameContext {
    pub fn new(config: CoreConfig, assets: AssetStore) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            cull_margin_px = config.view.cull_margin_px,
            hold_duration_ms = config.interaction.hold_duration_ms,
            max_frame_delta_ms = config.frame.max_frame_delta_ms,
            target_fps = %super::timing::format_fps_cap(config.frame.target_fps),
            "frame_context_created"
        );
        Ok(Self {
            clock: FrameClock::new(config.frame.max_frame_delta_ms),
            pacer: RenderPacer::new(config.frame.target_fps),
            camera_rig: CameraRig::new(config.view.camera_smoothing_per_second),
            camera: None,
            culler: Box::new(LinearScan),
            visible: VisibleSet::default(),
            lighting: LightingCompositor::new(),
            flicker_rng: StdRng::seed_from_u64(config.particles.seed ^ FLICKER_SEED_SALT),
            particles: ParticleSystem::new(&config.particles),
            animation: AnimationState::new(),
            interaction: InteractionMachine::new(config.interaction.clone()),
            messages: MessageLog::new(&config.messages),
            renderers: RendererRegistry::with_sprite_renderers(),
            assets,
            actor_order: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.interaction
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn camera(&self) -> Option<Camera> {
        self.camera
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn renderers_mut(&mut self) -> &mut RendererRegistry {
        &mut self.renderers
    }

    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    pub fn set_cull_strategy(&mut self, strategy: Box<dyn CullStrategy>) {
        self.culler = strategy;
    }

    /// Platform input, delivered whenever it arrives between frames.
    pub fn handle_input(&mut self, event: InputEvent, now_ms: u64) {
        self.interaction.handle_event(event, now_ms);
        self.collect_notices(now_ms);
    }

    /// Decodes queued sprites. Call between frames, never inside one.
    pub fn pump_assets(&mut self, budget: usize) -> usize {
        self.assets.pump(budget)
    }

    /// Sends queued intents. Failures become on-screen messages; interaction
    /// state is left as it is so the player can retry.
    pub fn flush_intents(&mut self, sink: &mut dyn IntentSink, now_ms: u64) -> usize {
        let failures = self.interaction.flush_intents(sink);
        for (_, error) in &failures {
            self.messages.post(error.to_string(), now_ms);
        }
        failures.len()
    }

    /// Runs one display frame to completion.
    pub fn frame(&mut self, inputs: FrameInputs<'_>, canvas: &mut Canvas<'_>) -> FrameReport {
        let now_ms = inputs.now_ms;
        let snapshot = inputs.snapshot;
        let delta = self.clock.advance(now_ms);
        let viewport = Viewport::new(canvas.width(), canvas.height());

        let focal = snapshot.local_actor().map(|actor| actor.position);
        let camera = self.camera_rig.update(focal, viewport, delta.dt_seconds());
        self.camera = Some(camera);
        self.culler
            .collect(snapshot, &camera, self.config.view.cull_margin_px, &mut self.visible);

        self.particles.sync_emitters(snapshot, &self.visible);
        self.particles.advance(delta.dt_ms);
        self.animation.advance(delta.dt_ms, snapshot);

        self.interaction.tick(TickInput {
            now_ms,
            snapshot,
            targets: inputs.targets,
            camera_offset: camera.offset,
        });
        self.collect_notices(now_ms);
        self.messages.expire(now_ms);

        let mut report = FrameReport {
            delta,
            drew: false,
            layers: Vec::new(),
            visible_count: self.visible.len(),
            particle_count: self.particles.len(),
            camera_offset: camera.offset,
            actor_draw_order: Vec::new(),
        };
        if !self.pacer.should_draw(now_ms) {
            return report;
        }
        report.drew = true;
        self.draw(snapshot, &camera, now_ms, canvas, &mut report);
        report
    }

    fn collect_notices(&mut self, now_ms: u64) {
        for notice in self.interaction.take_notices() {
            self.messages.post(notice, now_ms);
        }
    }

    fn draw(
        &mut self,
        snapshot: &WorldSnapshot,
        camera: &Camera,
        now_ms: u64,
        canvas: &mut Canvas<'_>,
        report: &mut FrameReport,
    ) {
        canvas.clear(CLEAR_COLOR);
        if let Some(tilemap) = &snapshot.tilemap {
            draw_tiles(canvas, tilemap, camera);
        }
        report.layers.push(RenderLayer::World);

        self.sort_actors(snapshot);
        let ground = ground_entities(&self.visible, snapshot);
        let actors = sorted_actors(&self.actor_order, snapshot);

        for entity in ground.iter().chain(actors.iter()) {
            let radius = self.renderers.get(entity.kind).shadow_radius(entity);
            let offset = self.animation.offset_for(entity, now_ms);
            if let Some(ground) = camera.world_to_pixel(entity.position) {
                draw_shadow(canvas, (ground.0 + offset.offset.x.round() as i32, ground.1), radius, offset.shadow_scale);
            }
        }
        report.layers.push(RenderLayer::Shadows);

        for entity in &ground {
            self.draw_entity(canvas, camera, entity, now_ms);
        }
        report.layers.push(RenderLayer::GroundItems);

        for entity in &actors {
            self.draw_entity(canvas, camera, entity, now_ms);
        }
        report.actor_draw_order = actors.iter().map(|entity| entity.id).collect();
        report.layers.push(RenderLayer::Entities);

        draw_particles(canvas, self.particles.particles(), camera);
        report.layers.push(RenderLayer::Particles);

        self.draw_labels(canvas, snapshot, camera, now_ms);
        report.layers.push(RenderLayer::Labels);

        if let (Some(item), Some(pointer)) = (self.interaction.placement(), self.interaction.pointer_screen()) {
            let world = camera.screen_to_world(pointer);
            let valid = check_placement(snapshot, world, self.config.interaction.placement_max_distance_px).is_ok();
            draw_placement_preview(canvas, (pointer.x.round() as i32, pointer.y.round() as i32), item, valid);
            report.layers.push(RenderLayer::PlacementPreview);
        }

        let lights = collect_light_sources(snapshot, &self.config.lighting);
        let (overlay, mask) = self.lighting.compose(
            &self.config.lighting,
            snapshot.cycle_progress,
            &lights,
            camera.offset,
            (camera.viewport.width, camera.viewport.height),
            &mut self.flicker_rng,
        );
        apply_lighting(canvas, overlay, mask);
        report.layers.push(RenderLayer::Lighting);

        let glow_radius = CAMPFIRE_GLOW_RADIUS_PX as f32;
        for light in lights.iter().filter(|light| light.kind == LightKind::Campfire) {
            let screen = camera.world_to_screen(light.position);
            if !circle_touches_viewport(screen, glow_radius, camera.viewport.width, camera.viewport.height) {
                continue;
            }
            if let Some(center) = camera.world_to_pixel(light.position) {
                draw_campfire_glow(canvas, center, CAMPFIRE_GLOW_RADIUS_PX, CAMPFIRE_GLOW_STRENGTH * overlay.alpha.max(0.2));
            }
        }
        self.draw_hold_indicator(canvas, snapshot, camera, now_ms);
        draw_messages(canvas, self.messages.visible(now_ms));
        draw_status(canvas, &self.status_lines());
        report.layers.push(RenderLayer::Indicators);

        if self.interaction.minimap_open() {
            draw_minimap(canvas, snapshot, camera);
            report.layers.push(RenderLayer::Minimap);
        }

        if let Weather::Rain { intensity } = snapshot.weather {
            draw_rain(canvas, intensity, now_ms);
        }
        report.layers.push(RenderLayer::Weather);
    }

    /// Sorts only the visible actors, by world y then id.
    fn sort_actors(&mut self, snapshot: &WorldSnapshot) {
        self.actor_order.clear();
        for kind in DYNAMIC_KINDS {
            for id in self.visible.of_kind(kind) {
                if let Some(entity) = snapshot.find(*id) {
                    self.actor_order.push((entity.position.y, entity.id));
                }
            }
        }
        self.actor_order
            .sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    }

    fn draw_entity(&mut self, canvas: &mut Canvas<'_>, camera: &Camera, entity: &Entity, now_ms: u64) {
        let offset = self.animation.offset_for(entity, now_ms);
        let Some(screen) = camera.world_to_pixel(entity.position + offset.offset) else {
            return;
        };
        let sprite = self.renderers.sprite_for(entity, &mut self.assets);
        self.renderers.get(entity.kind).draw(
            canvas,
            &EntityDraw {
                entity,
                screen,
                offset,
                sprite,
                now_ms,
            },
        );
    }

    fn draw_labels(&self, canvas: &mut Canvas<'_>, snapshot: &WorldSnapshot, camera: &Camera, now_ms: u64) {
        for entity in sorted_actors(&self.actor_order, snapshot) {
            let Some(actor) = entity.actor() else {
                continue;
            };
            if actor.name.is_empty() || Some(entity.id) == snapshot.local_player {
                continue;
            }
            let lifted = entity.position + self.animation.offset_for(entity, now_ms).offset;
            if let Some((x, y)) = camera.world_to_pixel(lifted) {
                draw_label(canvas, (x, y - 14), &actor.name.to_uppercase());
            }
        }

        if self.interaction.ui_mode() != UiMode::Playing || self.interaction.hold_session().is_some() {
            return;
        }
        let targets = self.interaction.targets();
        let config = &self.config.interaction;
        let hints = [
            targets.first_valid(&config.hold_priority),
            targets.first_valid(&config.tap_priority),
        ];
        let mut drawn: Option<EntityId> = None;
        for (category, id) in hints.into_iter().flatten() {
            if drawn == Some(id) {
                continue;
            }
            let Some(entry) = self.visible.get(id) else {
                continue;
            };
            if !entry.screen.is_finite() {
                continue;
            }
            draw_target_hint(canvas, (entry.screen.x.round() as i32, entry.screen.y.round() as i32), category);
            drawn = Some(id);
        }
    }

    fn draw_hold_indicator(&self, canvas: &mut Canvas<'_>, snapshot: &WorldSnapshot, camera: &Camera, now_ms: u64) {
        let Some(progress) = self.interaction.hold_progress(now_ms) else {
            return;
        };
        let anchor = self
            .visible
            .get(progress.target_id)
            .map(|entry| entry.screen)
            .or_else(|| snapshot.local_actor().map(|actor| camera.world_to_screen(actor.position)))
            .filter(|screen| screen.is_finite());
        if let Some(screen) = anchor {
            let center = (screen.x.round() as i32, screen.y.round() as i32 - HOLD_RING_LIFT_PX);
            draw_hold_ring(canvas, center, progress.fraction);
        }
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.interaction.auto_attack() {
            lines.push("AUTO-ATTACK".to_string());
        }
        if let Some(item) = self.interaction.placement() {
            lines.push(format!("PLACE: {}", item.label().to_uppercase()));
        }
        if self.interaction.ui_mode().is_blocking() {
            lines.push(self.interaction.ui_mode().label().to_uppercase());
        }
        lines
    }

    /// Drops frame-local state, e.g. after a respawn or reconnect.
    pub fn reset_session(&mut self) {
        debug!("frame_context_reset");
        self.camera_rig.reset();
        self.camera = None;
        self.visible.clear();
        self.particles.clear();
        self.animation = AnimationState::new();
        self.clock = FrameClock::new(self.config.frame.max_frame_delta_ms);
        self.pacer = RenderPacer::new(self.config.frame.target_fps);
    }
}

fn ground_entities<'a>(visible: &VisibleSet, snapshot: &'a WorldSnapshot) -> Vec<&'a Entity> {
    GROUND_KINDS
        .into_iter()
        .flat_map(|kind| {
            let collection = snapshot.collection(kind);
            visible
                .of_kind(kind)
                .iter()
                .filter_map(move |id| collection.and_then(|collection| collection.get(id)))
        })
        .collect()
}

fn sorted_actors<'a>(order: &[(f32, EntityId)], snapshot: &'a WorldSnapshot) -> Vec<&'a Entity> {
    order.iter().filter_map(|(_, id)| snapshot.find(*id)).collect()
}
