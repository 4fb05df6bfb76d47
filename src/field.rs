use glam::{DVec2, dvec2};
use serde::{Deserialize, Serialize};

use crate::config::Params;
use crate::noise::{fbm, noise2d, smoothstep};

/// Which flow-field realization drives the color ramp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldVariant {
    /// Three anisotropic noise layers drifting in opposing directions.
    #[default]
    Simple,
    /// Swirl, fbm domain warp and traveling waves.
    Rich,
}

impl FieldVariant {
    pub const ALL: [FieldVariant; 2] = [FieldVariant::Simple, FieldVariant::Rich];

    pub fn name(self) -> &'static str {
        match self {
            FieldVariant::Simple => "simple",
            FieldVariant::Rich => "rich",
        }
    }

    #[inline]
    pub fn evaluate(self, uv: DVec2, time: f64, params: &Params) -> f64 {
        match self {
            FieldVariant::Simple => simple_field(uv, time, params),
            FieldVariant::Rich => rich_field(uv, time, params),
        }
    }
}

impl std::str::FromStr for FieldVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field variant {s:?} (expected simple or rich)"))
    }
}

/// Field value in [0, 1] for an aspect-corrected coordinate, using the
/// variant selected in `params`.
#[inline]
pub fn field(uv: DVec2, time: f64, params: &Params) -> f64 {
    params.variant.evaluate(uv, time, params)
}

/// Shared tail of both variants: S-curve, contrast exponent, clamp.
#[inline]
fn shape(value: f64, contrast: f64) -> f64 {
    smoothstep(0.0, 1.0, value).powf(contrast).clamp(0.0, 1.0)
}

pub fn simple_field(uv: DVec2, time: f64, params: &Params) -> f64 {
    let t = time * params.animation_speed;
    let s = params.noise_scale;

    // Broad diagonal bands.
    let mut flow = noise2d(dvec2(uv.x * 0.8, uv.y * 2.5) * s + dvec2(t * 0.15, t * 0.3));
    flow += 0.6 * noise2d(dvec2(uv.x * 1.2, uv.y * 1.8) * s + dvec2(-t * 0.2, t * 0.15));
    flow += 0.3 * noise2d(dvec2(uv.x * 2.0, uv.y * 0.8) * s + dvec2(t * 0.1, -t * 0.2));

    shape(flow * 0.35 + 0.5, params.contrast_boost)
}

#[inline]
fn unit(angle: f64) -> DVec2 {
    dvec2(angle.cos(), angle.sin())
}

pub fn rich_field(uv: DVec2, time: f64, params: &Params) -> f64 {
    let t = time * params.animation_speed;
    let s = params.noise_scale;
    let flow = params.flow_intensity;
    let wc = params.wave_complexity;
    let mut p = uv * s;

    // Swirl around the viewport center, rotation rate breathing over time.
    let to_center = uv - dvec2(0.5, 0.5);
    let dist = to_center.length();
    let angle = to_center.y.atan2(to_center.x);
    let swirl_speed = (t * 0.15).sin() * 0.5 + 0.5;
    let swirl_angle = angle + dist * 2.0 * swirl_speed * (t * 0.2).sin();
    let swirl_offset = unit(swirl_angle) * dist * 0.3 * flow;

    // Domain warp along two directions 120 degrees apart.
    let warp_angle = t * 0.1;
    let dir_a = unit(warp_angle);
    let dir_b = unit(warp_angle + 2.094);
    let warp = dvec2(
        fbm(p * 0.8 + dir_a * t * 0.2, t * 0.2),
        fbm(p * 0.8 + dir_b * t * 0.15, t * 0.15),
    );
    p += warp * flow * 0.35;
    p += swirl_offset * 0.2;

    let pulse_a = (t * 0.08).sin() * 0.4 + 1.0;
    let pulse_b = (t * 0.12 + 1.5).sin() * 0.3 + 1.0;

    let mut waves = 0.0;

    let dir1 = unit(0.7 + (t * 0.05).sin() * 0.3);
    let wave1 = (p.dot(dir1) * 3.0 * wc + t * 1.2 * pulse_a + fbm(p * 2.0, t) * 2.0).sin();
    waves += wave1 * 0.35;

    let dir2 = unit(2.4 - (t * 0.07).sin() * 0.4);
    let wave2 =
        (p.dot(dir2) * 2.5 * wc - t * 1.0 * pulse_b + fbm(p * 1.5 + 10.0, t) * 1.5).sin();
    waves += wave2 * 0.3;

    let vertical_shift = (t * 0.09).sin() * 0.5;
    let wave3 = ((p.y + p.x * 0.3 * vertical_shift) * 2.8 * wc + t * 0.8).sin();
    waves += wave3 * 0.2;

    // Radial ripple from a drifting origin, measured in unscaled space.
    let wave_center = dvec2(0.5 + (t * 0.1).sin() * 0.3, 0.5 + (t * 0.08).cos() * 0.3);
    let radial = (p / s - wave_center).length();
    let wave4 = (radial * 4.0 * wc - t * 0.5).sin();
    waves += wave4 * 0.15;

    let mut field = waves * 0.45 + 0.5;
    field += fbm(p * 3.0 + dvec2(t * 0.15, -t * 0.12), t * 0.3) * 0.1;
    field += (t * 0.18).sin() * 0.04 + (t * 0.07).sin() * 0.03;
    let local = noise2d(uv * 2.0 + dvec2((t * 0.1).sin(), (t * 0.12).cos()) * 0.5);
    field += local * 0.06;

    // Pull toward the bright half so the darks stay shallow.
    let field = (field * 0.7 + 0.3).clamp(0.0, 1.0);
    shape(field, params.contrast_boost)
}
