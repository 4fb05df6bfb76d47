use std::path::Path;

use base64::Engine;
use glam::{DVec2, dvec2};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use rayon::prelude::*;

use crate::color::{Palette, Rgb, color_ramp};
use crate::config::Params;
use crate::error::Result;
use crate::field::field;
use crate::grid::Grid;
use crate::noise::mix;
use crate::ridge::{displace, ridge_displacement};
use crate::rng::grain_hash;
use crate::surface::Surface;

/// Everything the pipeline computes for one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub ridge: f64,
    pub field: f64,
    pub color: Rgb,
}

/// Per-frame inputs that don't change from pixel to pixel.
pub struct FrameInputs<'a> {
    pub params: &'a Params,
    pub palette: Palette,
    pub surface: Surface,
    pub aspect: f64,
    pub resolution: DVec2,
    pub time: f64,
}

impl<'a> FrameInputs<'a> {
    /// The surface is pulled back into range first, so every buffer sized
    /// from `inputs.surface` is addressable.
    pub fn new(surface: Surface, time: f64, params: &'a Params) -> Self {
        let surface = surface.bounded();
        Self {
            params,
            palette: params.palette(),
            surface,
            aspect: surface.aspect(),
            resolution: surface.resolution(),
            time,
        }
    }

    /// Ridge value and the aspect-corrected point the field is read at.
    /// The glass displaces the coordinate first; the field is sampled there.
    #[inline]
    pub fn field_coord(&self, uv: DVec2) -> (f64, DVec2) {
        let ridge = ridge_displacement(uv, self.time, self.params);
        let displaced = displace(uv, ridge, self.params.displacement_strength);
        (ridge, dvec2(displaced.x * self.aspect, displaced.y))
    }

    #[inline]
    pub fn sample(&self, uv: DVec2) -> Sample {
        let (ridge, coord) = self.field_coord(uv);
        let value = field(coord, self.time, self.params).clamp(0.0, 1.0);
        let grain = grain(uv, self.resolution, self.time, self.params.grain_intensity);
        Sample {
            ridge,
            field: value,
            color: composite(color_ramp(value, &self.palette), ridge, grain),
        }
    }
}

/// Film grain offset for a pixel. Resolution-dependent so each device
/// pixel draws its own value.
#[inline]
pub fn grain(uv: DVec2, resolution: DVec2, time: f64, intensity: f64) -> f64 {
    (grain_hash(uv * resolution, time * 10.0) - 0.5) * intensity
}

/// Shade a ramp color with the glass ridge and add grain.
#[inline]
pub fn composite(base: Rgb, ridge: f64, grain: f64) -> Rgb {
    // Peaks brighter, valleys darker.
    let shading = ridge * 0.5 + 0.5;
    let specular = shading.max(0.0).powi(4) * 0.08;
    base.scale(mix(0.85, 1.1, shading))
        .offset(specular)
        .offset(grain)
        .clamp01()
}

/// Final color for a single pixel coordinate.
pub fn shade_pixel(uv: DVec2, surface: Surface, time: f64, params: &Params) -> Rgb {
    FrameInputs::new(surface, time, params).sample(uv).color
}

#[inline]
fn put(row: &mut [u8], x: usize, color: Rgb) {
    let [r, g, b] = color.to_rgb8();
    row[x * 4..x * 4 + 4].copy_from_slice(&[r, g, b, 255]);
}

fn rgba_buffer(surface: Surface) -> Vec<u8> {
    vec![0u8; surface.rgba_len().unwrap_or(0)]
}

/// Render one frame as RGBA8, rows in parallel. Oversized surfaces render
/// at their clamped size.
pub fn render_frame(surface: Surface, time: f64, params: &Params) -> Vec<u8> {
    let inputs = FrameInputs::new(surface, time, params);
    let surface = inputs.surface;
    let w = surface.width as usize;
    let mut rgba = rgba_buffer(surface);

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let uv = surface.uv(x as u32, y as u32);
            put(row, x, inputs.sample(uv).color);
        }
    });

    rgba
}

/// Ridge displacement per pixel.
pub fn ridge_layer(inputs: &FrameInputs) -> Grid<f64> {
    let s = inputs.surface;
    let mut grid = Grid::<f64>::new(s.width as usize, s.height as usize);
    let w = grid.w;
    grid.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = ridge_displacement(s.uv(x as u32, y as u32), inputs.time, inputs.params);
        }
    });
    grid
}

/// Field value per pixel, sampled through the given ridge layer.
pub fn field_layer(inputs: &FrameInputs, ridge: &Grid<f64>) -> Grid<f64> {
    let s = inputs.surface;
    let mut grid = Grid::<f64>::new(ridge.w, ridge.h);
    let w = grid.w;
    grid.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let uv = s.uv(x as u32, y as u32);
            let d = displace(uv, ridge.get(x, y), inputs.params.displacement_strength);
            let coord = dvec2(d.x * inputs.aspect, d.y);
            *out = field(coord, inputs.time, inputs.params).clamp(0.0, 1.0);
        }
    });
    grid
}

/// Color, shade and grain precomputed ridge and field layers.
pub fn composite_layers(inputs: &FrameInputs, ridge: &Grid<f64>, field: &Grid<f64>) -> Vec<u8> {
    let s = inputs.surface;
    let w = s.width as usize;
    let mut rgba = rgba_buffer(s);
    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let uv = s.uv(x as u32, y as u32);
            let g = grain(uv, inputs.resolution, inputs.time, inputs.params.grain_intensity);
            let base = color_ramp(field.get(x, y), &inputs.palette);
            put(row, x, composite(base, ridge.get(x, y), g));
        }
    });
    rgba
}

/// Diagnostic: grayscale of a scalar layer mapped from [lo, hi].
pub fn render_scalar(grid: &Grid<f64>, lo: f64, hi: f64) -> Vec<u8> {
    let range = (hi - lo).max(1e-9);
    let mut rgba = vec![0u8; grid.w * grid.h * 4];
    for (px, v) in rgba.chunks_exact_mut(4).zip(&grid.data) {
        let g = (((v - lo) / range).clamp(0.0, 1.0) * 255.0).round() as u8;
        px.copy_from_slice(&[g, g, g, 255]);
    }
    rgba
}

pub fn encode_png(rgba: &[u8], surface: Surface) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        rgba,
        surface.width,
        surface.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub fn png_data_url(rgba: &[u8], surface: Surface) -> Result<String> {
    let png = encode_png(rgba, surface)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{b64}"))
}

pub fn save_png(path: &Path, rgba: &[u8], surface: Surface) -> Result<()> {
    image::save_buffer(path, rgba, surface.width, surface.height, image::ColorType::Rgba8)?;
    Ok(())
}
