//! Cheap stateless hash for film grain. Not spatially coherent, and not
//! meant to be: every device pixel gets an independent sample.
use glam::{DVec2, dvec2};

use crate::noise::fract;

const GRAIN_DIR: DVec2 = dvec2(12.9898, 78.233);
const GRAIN_GAIN: f64 = 43758.5453;

/// Returns a value in [0, 1) for a pixel-space point and a time seed.
#[inline]
pub fn grain_hash(st: DVec2, seed: f64) -> f64 {
    fract((st + seed).dot(GRAIN_DIR).sin() * GRAIN_GAIN)
}
