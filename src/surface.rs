use glam::{DVec2, dvec2};
use serde::{Deserialize, Serialize};

/// Device-pixel-ratio cap for the live view.
pub const LIVE_MAX_PIXEL_RATIO: f64 = 2.0;
/// Device-pixel-ratio cap baked into exported wallpapers.
pub const EXPORT_MAX_PIXEL_RATIO: f64 = 1.5;
/// Largest side of a surface in device pixels.
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Viewport as reported by the display: CSS pixels plus device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default = "unit_ratio")]
    pub device_pixel_ratio: f64,
}

fn unit_ratio() -> f64 {
    1.0
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self { width, height, device_pixel_ratio }
    }

    pub fn surface(&self, max_pixel_ratio: f64) -> Surface {
        Surface::from_viewport(*self, max_pixel_ratio)
    }
}

/// Render target in device pixels. Between 1x1 and
/// `MAX_SURFACE_SIDE` on each side when built through `new`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(1, MAX_SURFACE_SIDE),
            height: height.clamp(1, MAX_SURFACE_SIDE),
        }
    }

    /// Same surface with both sides pulled back into range. For values
    /// built as struct literals.
    pub fn bounded(self) -> Self {
        Self::new(self.width, self.height)
    }

    /// Scale the viewport by its pixel ratio, capped at `max_pixel_ratio`.
    /// Fractional device sizes truncate, like assigning a canvas width.
    /// Oversized viewports are clamped to `MAX_SURFACE_SIDE`.
    pub fn from_viewport(viewport: Viewport, max_pixel_ratio: f64) -> Self {
        let dpr = viewport.device_pixel_ratio;
        let ratio = if dpr.is_finite() && dpr > 0.0 { dpr.min(max_pixel_ratio) } else { 1.0 };
        Self::new(
            (viewport.width as f64 * ratio) as u32,
            (viewport.height as f64 * ratio) as u32,
        )
    }

    #[inline]
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Resolution uniform: width and height in device pixels.
    #[inline]
    pub fn resolution(&self) -> DVec2 {
        dvec2(self.width as f64, self.height as f64)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Size of an RGBA8 buffer for this surface, None if it can't be addressed.
    pub fn rgba_len(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)?.checked_mul(4)
    }

    /// Normalized coordinate of a pixel center. `row` counts from the top,
    /// v grows upward.
    #[inline]
    pub fn uv(&self, x: u32, row: u32) -> DVec2 {
        dvec2(
            (x as f64 + 0.5) / self.width as f64,
            1.0 - (row as f64 + 0.5) / self.height as f64,
        )
    }
}
