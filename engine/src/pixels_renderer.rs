use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use winit::window::Window;

use crate::graphics::{CpuRenderer, Renderer2d};
use crate::surface::{Surface, SurfaceSize};

/// Windowed presenter built on `pixels`.
///
/// Rendering happens on the CPU into the `pixels` frame buffer; `present` uploads it and lets
/// `pixels` scale it to the window.
pub struct PixelsRenderer2d {
    pixels: Pixels,
    size: SurfaceSize,
}

impl PixelsRenderer2d {
    pub fn new(window: &Window, size: SurfaceSize, vsync: bool) -> Result<Self, pixels::Error> {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, window);
        let pixels = PixelsBuilder::new(size.width, size.height, surface_texture)
            .enable_vsync(vsync)
            .build()?;
        Ok(Self { pixels, size })
    }

    pub fn resize_window(&mut self, width: u32, height: u32) -> Result<(), pixels::Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }

    pub fn draw_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn Renderer2d) -> R,
    {
        let size = self.size;
        let mut cpu = CpuRenderer::new(self.pixels.frame_mut(), size);
        cpu.begin_frame(size);
        f(&mut cpu)
    }
}

impl Surface for PixelsRenderer2d {
    type Error = pixels::Error;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        self.pixels.frame_mut()
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.pixels.render()
    }
}
