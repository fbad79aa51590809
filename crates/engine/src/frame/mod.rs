mod animation;
mod messages;
mod orchestrator;
mod particles;
mod timing;

pub use animation::{jump_height, AnimationState, VisualOffset, JUMP_DURATION_MS, JUMP_HEIGHT_PX};
pub use messages::{Message, MessageLog};
pub use orchestrator::{FrameContext, FrameInputs, FrameReport, RenderLayer};
pub use particles::{Particle, ParticleKind, ParticleStats, ParticleSystem};
pub use timing::{format_fps_cap, FrameClock, FrameDelta, RenderPacer};
