//! Window size bookkeeping shared by the camera and the renderer

use winit::dpi::PhysicalSize;

/// Logical canvas size and the pixel ratio it is rendered at
///
/// The render size is the logical size times `min(scale_factor, max_ratio)`,
/// so high-DPI displays do not render more than `max_ratio` pixels per point.
/// The physical size is the window's and is what the surface is configured at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub physical_width: u32,
    pub physical_height: u32,
    pub logical_width: f32,
    pub logical_height: f32,
    pub pixel_ratio: f32,
    pub render_width: u32,
    pub render_height: u32,
}

impl Viewport {
    pub fn resize(physical: PhysicalSize<u32>, scale_factor: f64, max_ratio: f32) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
        let logical_width = physical.width as f32 / scale;
        let logical_height = physical.height as f32 / scale;
        let pixel_ratio = scale.min(max_ratio);

        Self {
            physical_width: physical.width,
            physical_height: physical.height,
            logical_width,
            logical_height,
            pixel_ratio,
            render_width: (logical_width * pixel_ratio).round() as u32,
            render_height: (logical_height * pixel_ratio).round() as u32,
        }
    }

    /// Fits every size within a device texture limit
    ///
    /// The render size shrinks uniformly so the aspect ratio survives; the
    /// physical size is clamped per axis.
    pub fn clamped(self, max_dimension: u32) -> Self {
        let max_dimension = max_dimension.max(1);
        let mut viewport = self;
        viewport.physical_width = self.physical_width.min(max_dimension);
        viewport.physical_height = self.physical_height.min(max_dimension);

        let largest = self.render_width.max(self.render_height);
        if largest > max_dimension {
            let scale = max_dimension as f32 / largest as f32;
            viewport.pixel_ratio = self.pixel_ratio * scale;
            let shrink = |size: u32| ((size as f32 * scale).round() as u32).clamp(1, max_dimension);
            viewport.render_width = shrink(self.render_width);
            viewport.render_height = shrink(self.render_height);
        }
        viewport
    }

    /// A minimised window has nothing to render
    pub fn is_empty(&self) -> bool {
        self.render_width == 0 || self.render_height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.logical_height > 0.0 {
            self.logical_width / self.logical_height
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn standard_display_renders_at_native_size() {
        let viewport = Viewport::resize(PhysicalSize::new(1200, 800), 1.0, 2.0);
        assert_eq!((viewport.render_width, viewport.render_height), (1200, 800));
        assert_relative_eq!(viewport.aspect(), 1.5);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let viewport = Viewport::resize(PhysicalSize::new(3600, 2400), 3.0, 2.0);
        assert_relative_eq!(viewport.logical_width, 1200.0);
        assert_relative_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!((viewport.render_width, viewport.render_height), (2400, 1600));
        assert_relative_eq!(viewport.aspect(), 1.5);
    }

    #[test]
    fn retina_below_cap_keeps_physical_size() {
        let viewport = Viewport::resize(PhysicalSize::new(2000, 1000), 2.0, 2.0);
        assert_eq!((viewport.render_width, viewport.render_height), (2000, 1000));
        assert_relative_eq!(viewport.aspect(), 2.0);
    }

    #[test]
    fn minimised_window_is_empty() {
        let viewport = Viewport::resize(PhysicalSize::new(0, 0), 1.0, 2.0);
        assert!(viewport.is_empty());
        assert_relative_eq!(viewport.aspect(), 1.0);
    }

    #[test]
    fn render_aspect_matches_logical_aspect() {
        let viewport = Viewport::resize(PhysicalSize::new(2880, 1620), 2.5, 2.0);
        let render_aspect = viewport.render_width as f32 / viewport.render_height as f32;
        assert_relative_eq!(render_aspect, viewport.aspect(), epsilon = 1e-3);
    }

    #[test]
    fn physical_size_is_kept_for_the_surface() {
        let viewport = Viewport::resize(PhysicalSize::new(3600, 2400), 3.0, 2.0);
        assert_eq!((viewport.physical_width, viewport.physical_height), (3600, 2400));
    }

    #[test]
    fn five_k_display_fits_texture_limit() {
        let viewport = Viewport::resize(PhysicalSize::new(5120, 2880), 2.0, 2.0).clamped(4096);
        assert_eq!((viewport.render_width, viewport.render_height), (4096, 2304));
        assert_eq!((viewport.physical_width, viewport.physical_height), (4096, 2880));
        assert_relative_eq!(viewport.pixel_ratio, 1.6);
        let render_aspect = viewport.render_width as f32 / viewport.render_height as f32;
        assert_relative_eq!(render_aspect, viewport.aspect(), epsilon = 1e-3);
    }

    #[test]
    fn clamping_within_limit_changes_nothing() {
        let viewport = Viewport::resize(PhysicalSize::new(1920, 1080), 1.0, 2.0);
        assert_eq!(viewport.clamped(8192), viewport);
    }

    #[test]
    fn tall_window_clamps_on_height() {
        let viewport = Viewport::resize(PhysicalSize::new(1000, 6000), 1.0, 2.0).clamped(4096);
        assert_eq!(viewport.render_height, 4096);
        assert_eq!(viewport.render_width, 683);
    }
}
