mod compositor;
mod schedule;

pub use compositor::{
    circle_touches_viewport, collect_light_sources, DarknessOverlay, LightKind, LightMask, LightSource,
    LightingCompositor,
};
pub use schedule::{CyclePhase, DayNightSchedule};
