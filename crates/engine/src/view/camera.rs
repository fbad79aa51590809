use crate::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Per-frame camera. `screen = world + offset`, y down, one world unit per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub focal: Vec2,
    pub offset: Vec2,
    pub viewport: Viewport,
}

impl Camera {
    pub fn centered_on(focal: Vec2, viewport: Viewport) -> Self {
        Self {
            focal,
            offset: viewport.center() - focal,
            viewport,
        }
    }

    pub fn from_offset(offset: Vec2, viewport: Viewport) -> Self {
        Self {
            focal: viewport.center() - offset,
            offset,
            viewport,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.offset
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen - self.offset
    }

    /// Nearest pixel for a world position, `None` when it cannot be represented.
    pub fn world_to_pixel(&self, world: Vec2) -> Option<(i32, i32)> {
        let screen = self.world_to_screen(world);
        if !screen.is_finite() {
            return None;
        }
        let x = screen.x.round();
        let y = screen.y.round();
        if !pixel_in_range(x) || !pixel_in_range(y) {
            return None;
        }
        Some((x as i32, y as i32))
    }
}

/// Strictly inside the i32 range, so offsets from the result cannot overflow.
fn pixel_in_range(value: f32) -> bool {
    value > i32::MIN as f32 && value < i32::MAX as f32
}

/// Follows the local actor. Holds the last good offset so a missing or
/// non-finite actor position never produces a NaN camera.
#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    smoothing_per_second: f32,
    focal: Option<Vec2>,
    last_offset: Vec2,
}

impl CameraRig {
    pub fn new(smoothing_per_second: f32) -> Self {
        Self {
            smoothing_per_second: if smoothing_per_second.is_finite() {
                smoothing_per_second.max(0.0)
            } else {
                0.0
            },
            focal: None,
            last_offset: Vec2::ZERO,
        }
    }

    pub fn update(&mut self, target: Option<Vec2>, viewport: Viewport, dt_seconds: f32) -> Camera {
        let Some(target) = target.filter(|position| position.is_finite()) else {
            return Camera::from_offset(self.last_offset, viewport);
        };

        let focal = match self.focal {
            Some(previous) if self.smoothing_per_second > 0.0 => {
                let dt = if dt_seconds.is_finite() {
                    dt_seconds.max(0.0)
                } else {
                    0.0
                };
                let blend = 1.0 - (-self.smoothing_per_second * dt).exp();
                previous.lerp(target, blend)
            }
            _ => target,
        };
        self.focal = Some(focal);

        let camera = Camera::centered_on(focal, viewport);
        self.last_offset = camera.offset;
        camera
    }

    pub fn last_offset(&self) -> Vec2 {
        self.last_offset
    }

    /// Forget the focal point so the next update snaps, e.g. after a respawn.
    pub fn reset(&mut self) {
        self.focal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_centers_focal_point() {
        let camera = Camera::centered_on(Vec2::new(500.0, 300.0), Viewport::new(800, 600));
        assert_eq!(camera.offset, Vec2::new(-100.0, 0.0));
        assert_eq!(camera.world_to_screen(Vec2::new(500.0, 300.0)), Vec2::new(400.0, 300.0));
        assert_eq!(camera.screen_to_world(Vec2::new(0.0, 0.0)), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn world_to_pixel_rejects_coordinates_at_the_i32_limits() {
        let camera = Camera::centered_on(Vec2::new(50.0, 50.0), Viewport::new(100, 100));
        assert_eq!(camera.world_to_pixel(Vec2::new(10.4, 20.6)), Some((10, 21)));
        assert_eq!(camera.world_to_pixel(Vec2::new(i32::MIN as f32, 10.0)), None);
        assert_eq!(camera.world_to_pixel(Vec2::new(10.0, i32::MAX as f32)), None);
        assert_eq!(camera.world_to_pixel(Vec2::new(-1.0e12, 0.0)), None);
        assert_eq!(camera.world_to_pixel(Vec2::new(f32::INFINITY, 0.0)), None);
    }

    #[test]
    fn missing_actor_starts_at_zero_offset() {
        let mut rig = CameraRig::new(0.0);
        let camera = rig.update(None, Viewport::new(640, 480), 0.016);
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn missing_or_nan_actor_keeps_last_known_offset() {
        let mut rig = CameraRig::new(0.0);
        let viewport = Viewport::new(640, 480);
        let tracked = rig.update(Some(Vec2::new(1_000.0, 2_000.0)), viewport, 0.016);

        let absent = rig.update(None, viewport, 0.016);
        let nan = rig.update(Some(Vec2::new(f32::NAN, 3.0)), viewport, 0.016);

        assert_eq!(absent.offset, tracked.offset);
        assert_eq!(nan.offset, tracked.offset);
        assert!(nan.offset.is_finite());
    }

    #[test]
    fn smoothing_moves_partway_and_zero_dt_holds() {
        let mut rig = CameraRig::new(10.0);
        let viewport = Viewport::new(100, 100);
        rig.update(Some(Vec2::ZERO), viewport, 0.016);

        let held = rig.update(Some(Vec2::new(100.0, 0.0)), viewport, 0.0);
        assert_eq!(held.focal, Vec2::ZERO);

        let moved = rig.update(Some(Vec2::new(100.0, 0.0)), viewport, 0.1);
        assert!(moved.focal.x > 0.0 && moved.focal.x < 100.0);
    }

    #[test]
    fn snap_rig_tracks_exactly() {
        let mut rig = CameraRig::new(0.0);
        let camera = rig.update(Some(Vec2::new(12.5, -4.0)), Viewport::new(50, 20), 0.5);
        assert_eq!(camera.focal, Vec2::new(12.5, -4.0));
        assert_eq!(camera.world_to_pixel(Vec2::new(12.5, -4.0)), Some((25, 10)));
    }
}
