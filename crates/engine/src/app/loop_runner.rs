use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::{ConfigError, CoreConfig};
use crate::frame::{format_fps_cap, FrameContext, FrameInputs};
use crate::interaction::{IntentSink, InteractionTargets};
use crate::world::{Vec2, WorldSnapshot};

use super::metrics::MetricsAccumulator;
use super::rendering::{AssetStore, Presenter};
use super::{InputAction, InputEvent, MetricsHandle, Modifiers, PointerButton};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub asset_root: PathBuf,
    /// Sprites decoded between two frames at most.
    pub asset_decode_budget: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Ember".to_string(),
            window_width: 1280,
            window_height: 720,
            asset_root: PathBuf::from("assets"),
            asset_decode_budget: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize pixel surface: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("invalid core configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// The world side of the client: whatever produces snapshots and accepts
/// intents. Intents go through the `IntentSink` supertrait.
pub trait FrameSource: IntentSink {
    /// Brings the world up to `now_ms`. Called once per frame before drawing.
    fn update(&mut self, now_ms: u64);

    fn snapshot(&self) -> &WorldSnapshot;

    /// Closest interactable per category around the local actor.
    fn targets(&self) -> &InteractionTargets;
}

pub fn run_app<S>(config: LoopConfig, core: CoreConfig, source: S) -> Result<(), AppError>
where
    S: FrameSource + 'static,
{
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, core, source, metrics_handle)
}

pub fn run_app_with_metrics<S>(
    config: LoopConfig,
    core: CoreConfig,
    mut source: S,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError>
where
    S: FrameSource + 'static,
{
    let metrics_log_interval = Duration::from_millis(core.frame.metrics_log_interval_ms.max(1));
    let target_fps = core.frame.target_fps;
    let mut context = FrameContext::new(core, AssetStore::new(config.asset_root.clone()))?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut presenter = Presenter::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    info!(
        asset_root = %config.asset_root.display(),
        asset_decode_budget = config.asset_decode_budget,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_fps_cap(target_fps),
        "loop_config"
    );

    let started = Instant::now();
    let clock_ms = move || started.elapsed().as_millis() as u64;
    let mut input_collector = InputCollector::default();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let decode_budget = config.asset_decode_budget;
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = presenter.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::Focused(false) => {
                        context.handle_input(InputEvent::FocusLost, clock_ms());
                    }
                    WindowEvent::ModifiersChanged(modifiers) => {
                        let event = input_collector.modifiers_changed(modifiers.state());
                        context.handle_input(event, clock_ms());
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let event =
                            input_collector.cursor_moved(position.x as f32, position.y as f32);
                        context.handle_input(event, clock_ms());
                    }
                    WindowEvent::CursorLeft { .. } => {
                        let event = input_collector.cursor_left();
                        context.handle_input(event, clock_ms());
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if let Some(event) = input_collector.mouse_input(button, state) {
                            context.handle_input(event, clock_ms());
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        if let Some(event) = input_collector.mouse_wheel(delta) {
                            context.handle_input(event, clock_ms());
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if input_collector.is_quit_chord(event.physical_key, event.state) {
                            info!(reason = "quit_chord", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                        if let Some(input) =
                            input_collector.keyboard_input(event.physical_key, event.state, event.repeat)
                        {
                            context.handle_input(input, clock_ms());
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let frame_started = Instant::now();
                        let now_ms = clock_ms();
                        source.update(now_ms);

                        let inputs = FrameInputs {
                            now_ms,
                            snapshot: source.snapshot(),
                            targets: source.targets(),
                        };
                        let report = match presenter.present(&mut context, inputs) {
                            Ok(report) => report,
                            Err(error) => {
                                warn!(error = %error, "renderer_draw_failed");
                                window_target.exit();
                                return;
                            }
                        };

                        context.flush_intents(&mut source, now_ms);
                        context.pump_assets(decode_budget);

                        metrics_accumulator
                            .record_frame(&report, Instant::now().saturating_duration_since(frame_started));
                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
                            metrics_handle.publish(snapshot);
                            info!(
                                fps = snapshot.fps,
                                frame_time_ms = snapshot.frame_time_ms,
                                skipped_draws = snapshot.skipped_draws,
                                discarded_deltas = snapshot.discarded_deltas,
                                visible_count = snapshot.visible_count,
                                particle_count = snapshot.particle_count,
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                context.reset_session();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Turns winit window events into platform-neutral `InputEvent`s.
#[derive(Debug, Default)]
struct InputCollector {
    cursor_position_px: Option<Vec2>,
    modifiers: Modifiers,
}

impl InputCollector {
    fn keyboard_input(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) -> Option<InputEvent> {
        let action = action_for_key(key)?;
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown { action, repeat },
            ElementState::Released => InputEvent::KeyUp { action },
        })
    }

    /// Ctrl+Q. Escape belongs to the menu and placement cancel.
    fn is_quit_chord(&self, key: PhysicalKey, state: ElementState) -> bool {
        state == ElementState::Pressed
            && self.modifiers.ctrl
            && key == PhysicalKey::Code(KeyCode::KeyQ)
    }

    fn modifiers_changed(&mut self, state: ModifiersState) -> InputEvent {
        self.modifiers = Modifiers {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
        };
        InputEvent::ModifiersChanged(self.modifiers)
    }

    fn cursor_moved(&mut self, x: f32, y: f32) -> InputEvent {
        let position = Vec2::new(x, y);
        self.cursor_position_px = Some(position);
        InputEvent::PointerMoved { position }
    }

    fn cursor_left(&mut self) -> InputEvent {
        self.cursor_position_px = None;
        InputEvent::PointerLeft
    }

    /// Presses without a known cursor position are dropped.
    fn mouse_input(&mut self, button: MouseButton, state: ElementState) -> Option<InputEvent> {
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            _ => return None,
        };
        match state {
            ElementState::Pressed => {
                let position = self.cursor_position_px?;
                Some(InputEvent::PointerDown { button, position })
            }
            ElementState::Released => Some(InputEvent::PointerUp { button }),
        }
    }

    fn mouse_wheel(&mut self, delta: MouseScrollDelta) -> Option<InputEvent> {
        let steps = wheel_steps_from_scroll_delta(delta);
        (steps != 0).then_some(InputEvent::Wheel { steps })
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::KeyE => InputAction::Interact,
        KeyCode::KeyF => InputAction::ToggleAutoAttack,
        KeyCode::KeyM => InputAction::ToggleMinimap,
        KeyCode::Enter | KeyCode::NumpadEnter => InputAction::Chat,
        KeyCode::Tab | KeyCode::KeyI => InputAction::Inventory,
        KeyCode::Escape => InputAction::Menu,
        KeyCode::Digit1 => InputAction::Slot1,
        KeyCode::Digit2 => InputAction::Slot2,
        KeyCode::Digit3 => InputAction::Slot3,
        KeyCode::Digit4 => InputAction::Slot4,
        KeyCode::Digit5 => InputAction::Slot5,
        _ => return None,
    };
    Some(action)
}

fn wheel_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}
