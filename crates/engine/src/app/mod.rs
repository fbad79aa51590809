mod input;
mod loop_runner;
mod metrics;
pub mod rendering;

pub use input::{ActionStates, InputAction, InputEvent, Modifiers, PointerButton};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, FrameSource, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
