use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::frame::{FrameContext, FrameInputs, FrameReport};
use crate::view::Viewport;

use super::Canvas;

/// Owns the window's pixel surface. One surface pixel per window pixel.
pub struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Presenter {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport::new(size.width, size.height),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Rebuilds the surface for the new size. Zero sizes (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport::new(width, height);
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Runs one frame into the surface and presents it when the frame drew.
    pub fn present(&mut self, context: &mut FrameContext, inputs: FrameInputs<'_>) -> Result<FrameReport, Error> {
        let Viewport { width, height } = self.viewport;
        let report = {
            let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
            context.frame(inputs, &mut canvas)
        };
        if report.drew {
            self.pixels.render()?;
        }
        Ok(report)
    }
}
