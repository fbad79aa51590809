/// RGBA8 drawing surface over a borrowed frame buffer. Every write is clipped;
/// out-of-range coordinates are silently skipped.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        self.frame
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(out)
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel_offset = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))?;
        let byte_offset = pixel_offset.checked_mul(4)?;
        let end = byte_offset.checked_add(4)?;
        if end > self.frame.len() {
            return None;
        }
        Some(byte_offset)
    }

    /// Overwrites the pixel, ignoring alpha.
    pub fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.frame[offset..offset + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend using `color[3]` as coverage.
    pub fn blend(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let alpha = color[3];
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            self.put(x, y, color);
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let pixel = &mut self.frame[offset..offset + 4];
        for channel in 0..3 {
            pixel[channel] = mix(pixel[channel], color[channel], alpha);
        }
        pixel[3] = 255;
    }

    /// Additive blend of `rgb * intensity`, saturating per channel.
    pub fn add(&mut self, x: i32, y: i32, rgb: [u8; 3], intensity: f32) {
        if !(intensity > 0.0) {
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let intensity = intensity.min(1.0);
        let pixel = &mut self.frame[offset..offset + 4];
        for channel in 0..3 {
            let added = (rgb[channel] as f32 * intensity).round() as u8;
            pixel[channel] = pixel[channel].saturating_add(added);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        if end_x <= start_x || end_y <= start_y {
            return;
        }
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend(px, py, color);
            }
        }
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: [u8; 4]) {
        if rect_width <= 1 || rect_height <= 1 {
            return;
        }
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y + 1, 1, rect_height - 2, color);
        self.fill_rect(x + rect_width - 1, y + 1, 1, rect_height - 2, color);
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        if radius < 0 {
            return;
        }
        let Some(((x0, x1), (y0, y1))) = self.clip_square(cx, cy, radius, radius) else {
            return;
        };
        let radius_sq = i64::from(radius) * i64::from(radius);
        for dy in y0..=y1 {
            for dx in x0..=x1 {
                if distance_sq(dx, dy) <= radius_sq {
                    self.blend(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Filled ellipse, used for ground shadows.
    pub fn fill_ellipse(&mut self, cx: i32, cy: i32, radius_x: i32, radius_y: i32, color: [u8; 4]) {
        if radius_x <= 0 || radius_y <= 0 {
            return;
        }
        let Some(((x0, x1), (y0, y1))) = self.clip_square(cx, cy, radius_x, radius_y) else {
            return;
        };
        let rx = radius_x as f32;
        let ry = radius_y as f32;
        for dy in y0..=y1 {
            for dx in x0..=x1 {
                let nx = dx as f32 / rx;
                let ny = dy as f32 / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.blend(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Ring segment from 12 o'clock clockwise covering `fraction` of a turn.
    pub fn ring_arc(&mut self, cx: i32, cy: i32, radius: i32, thickness: i32, fraction: f32, color: [u8; 4]) {
        if radius <= 0 || thickness <= 0 || !(fraction > 0.0) {
            return;
        }
        let Some(((x0, x1), (y0, y1))) = self.clip_square(cx, cy, radius, radius) else {
            return;
        };
        let fraction = fraction.min(1.0);
        let outer_sq = i64::from(radius) * i64::from(radius);
        let inner = i64::from(radius.saturating_sub(thickness).max(0));
        let inner_sq = inner * inner;
        for dy in y0..=y1 {
            for dx in x0..=x1 {
                let d_sq = distance_sq(dx, dy);
                if d_sq > outer_sq || d_sq < inner_sq {
                    continue;
                }
                // Angle measured clockwise from straight up, in turns.
                let turns = (dx as f32).atan2(-(dy as f32)) / std::f32::consts::TAU;
                let turns = if turns < 0.0 { turns + 1.0 } else { turns };
                if turns <= fraction {
                    self.blend(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Additive radial glow that fades to nothing at `radius`.
    pub fn glow(&mut self, cx: i32, cy: i32, radius: i32, rgb: [u8; 3], peak: f32) {
        if radius <= 0 || !(peak > 0.0) {
            return;
        }
        let Some(((x0, x1), (y0, y1))) = self.clip_square(cx, cy, radius, radius) else {
            return;
        };
        let radius_f = radius as f32;
        for dy in y0..=y1 {
            for dx in x0..=x1 {
                let distance = (distance_sq(dx, dy) as f32).sqrt();
                if distance >= radius_f {
                    continue;
                }
                let falloff = 1.0 - distance / radius_f;
                self.add(cx + dx, cy + dy, rgb, peak * falloff * falloff);
            }
        }
    }

    /// Offset ranges of a `±radius_x` by `±radius_y` box around `(cx, cy)`
    /// that land on the canvas, or `None` when the box misses it entirely.
    fn clip_square(&self, cx: i32, cy: i32, radius_x: i32, radius_y: i32) -> Option<((i32, i32), (i32, i32))> {
        Some((
            clip_offsets(cx, radius_x, self.width)?,
            clip_offsets(cy, radius_y, self.height)?,
        ))
    }

    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 4]) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let step_x = if x < to.0 { 1 } else { -1 };
        let step_y = if y < to.1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.blend(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    /// Nearest-neighbour scaled blit, centred on `(center_x, center_y)`.
    pub fn blit_centered(&mut self, center_x: i32, center_y: i32, sprite: &SpriteImage, scale: f32) {
        if sprite.width == 0 || sprite.height == 0 {
            return;
        }
        let expected_len = sprite.width as usize * sprite.height as usize * 4;
        if sprite.rgba.len() < expected_len {
            return;
        }
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let scaled_w = (sprite.width as f32 * scale).round().max(1.0) as i32;
        let scaled_h = (sprite.height as f32 * scale).round().max(1.0) as i32;
        let left = center_x - scaled_w / 2;
        let top = center_y - scaled_h / 2;
        let inv_scale = scale.recip();
        let sprite_width = sprite.width as usize;

        for out_y in top.max(0)..(top + scaled_h).min(self.height as i32) {
            let src_y = (((out_y - top) as f32 * inv_scale).floor() as u32).min(sprite.height - 1);
            for out_x in left.max(0)..(left + scaled_w).min(self.width as i32) {
                let src_x = (((out_x - left) as f32 * inv_scale).floor() as u32).min(sprite.width - 1);
                let src = (src_y as usize * sprite_width + src_x as usize) * 4;
                let mut color = [0u8; 4];
                color.copy_from_slice(&sprite.rgba[src..src + 4]);
                self.blend(out_x, out_y, color);
            }
        }
    }
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Offsets in `-radius..=radius` with `center + offset` inside `0..limit`.
fn clip_offsets(center: i32, radius: i32, limit: u32) -> Option<(i32, i32)> {
    let center = i64::from(center);
    let radius = i64::from(radius.max(0));
    let low = (-radius).max(-center);
    let high = radius.min(i64::from(limit) - 1 - center);
    if low > high {
        return None;
    }
    Some((low as i32, high as i32))
}

fn distance_sq(dx: i32, dy: i32) -> i64 {
    let (dx, dy) = (i64::from(dx), i64::from(dy));
    dx * dx + dy * dy
}

fn mix(dst: u8, src: u8, alpha: u8) -> u8 {
    let alpha = alpha as u32;
    ((src as u32 * alpha + dst as u32 * (255 - alpha) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    #[test]
    fn writes_outside_bounds_are_ignored() {
        let mut frame = buffer(4, 4);
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.put(-1, 0, [255; 4]);
        canvas.put(4, 0, [255; 4]);
        canvas.fill_rect(-10, -10, 5, 5, [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn short_buffer_never_panics() {
        let mut frame = vec![0u8; 7];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.clear([9, 9, 9, 9]);
        canvas.fill_circle(2, 2, 3, [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(1, 0), None);
    }

    #[test]
    fn blend_mixes_by_alpha() {
        let mut frame = buffer(1, 1);
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([0, 0, 0, 255]);
        canvas.blend(0, 0, [255, 255, 255, 128]);
        let pixel = canvas.pixel(0, 0).unwrap_or_default();
        assert!((127..=129).contains(&pixel[0]));
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn additive_saturates() {
        let mut frame = buffer(1, 1);
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([250, 10, 0, 255]);
        canvas.add(0, 0, [100, 100, 100], 1.0);
        assert_eq!(canvas.pixel(0, 0), Some([255, 110, 100, 255]));
    }

    #[test]
    fn ring_arc_covers_requested_fraction() {
        let mut frame = buffer(21, 21);
        let mut canvas = Canvas::new(&mut frame, 21, 21);
        canvas.ring_arc(10, 10, 8, 2, 0.25, [255, 255, 255, 255]);
        // Top and right of the ring are inside the first quarter turn.
        assert_eq!(canvas.pixel(10, 3), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(17, 10), Some([255, 255, 255, 255]));
        // Bottom and left are not.
        assert_eq!(canvas.pixel(10, 17), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(3, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn blit_skips_transparent_texels() {
        let sprite = SpriteImage {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 0],
        };
        let mut frame = buffer(4, 4);
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.blit_centered(2, 2, &sprite, 1.0);
        assert_eq!(canvas.pixel(1, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = buffer(8, 8);
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.line((1, 1), (6, 4), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(6, 4), Some([255, 255, 255, 255]));
    }

    #[test]
    fn circles_far_off_canvas_are_skipped() {
        let mut frame = buffer(8, 8);
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.glow(i32::MIN, i32::MIN, 40, [255, 200, 120], 0.55);
        canvas.glow(i32::MAX, 3, 40, [255, 200, 120], 0.55);
        canvas.fill_circle(i32::MIN + 1, 0, 12, [255; 4]);
        canvas.fill_ellipse(3, i32::MAX, 6, 3, [255; 4]);
        canvas.ring_arc(i32::MIN, i32::MAX, 9, 2, 1.0, [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn glow_partly_on_canvas_lights_only_the_overlap() {
        let mut frame = buffer(8, 8);
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.glow(-3, 4, 5, [200, 200, 200], 1.0);
        assert!(canvas.pixel(0, 4).map_or(false, |pixel| pixel[0] > 0));
        assert_eq!(canvas.pixel(5, 4), Some([0, 0, 0, 0]));
    }
}
