use glam::{DVec2, dvec2};

use crate::config::Params;
use crate::noise::noise2d;

// Kept at the shader's literal rather than TAU so output matches exported wallpapers.
#[allow(clippy::approx_constant)]
const RIDGE_PERIOD: f64 = 6.28318;

/// Vertical displacement of the ribbed glass at `uv`, roughly in [-1.3, 1.3].
///
/// Ridges run vertically, `line_frequency` of them across the width. Their
/// position wobbles with `ridge_waviness` and their depth varies along y.
pub fn ridge_displacement(uv: DVec2, time: f64, params: &Params) -> f64 {
    let t = time * params.animation_speed * 0.5;

    let mut ridge_x = uv.x * params.line_frequency;
    ridge_x += noise2d(dvec2(uv.x * 3.0, uv.y * 8.0 + t)) * params.ridge_waviness * 0.3;

    let ridge = (ridge_x * RIDGE_PERIOD).sin();
    let y_variation = noise2d(dvec2(uv.x * 5.0, uv.y * 2.0 + t * 0.3)) * 0.3;
    ridge * (1.0 + y_variation)
}

/// Shift the sampling coordinate through the glass. Must be applied before
/// the field is sampled.
#[inline]
pub fn displace(uv: DVec2, ridge: f64, strength: f64) -> DVec2 {
    dvec2(uv.x, uv.y + ridge * strength)
}
