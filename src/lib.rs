pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod field;
pub mod grid;
pub mod noise;
pub mod render;
pub mod ridge;
pub mod rng;
pub mod surface;

use std::time::Instant;

use log::debug;

use config::Params;
use grid::Grid;
use render::FrameInputs;
use surface::Surface;

pub use error::{Error, Result};

/// One frame plus the intermediate layers it was built from.
pub struct Layers {
    pub surface: Surface,
    pub time: f64,
    pub ridge: Grid<f64>,
    pub field: Grid<f64>,
    pub rgba: Vec<u8>,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Run the pipeline stage by stage, keeping each layer. Produces the same
/// pixels as `render::render_frame`.
pub fn generate(surface: Surface, time: f64, params: &Params) -> (Layers, Vec<Timing>) {
    let mut timings = Vec::new();
    let total_start = Instant::now();
    let mut params = params.clone();
    params.sanitize();
    let inputs = FrameInputs::new(surface, time, &params);
    let surface = inputs.surface;

    // 1. Ridge displacement of the glass
    let t = Instant::now();
    let ridge = render::ridge_layer(&inputs);
    timings.push(Timing {
        name: "ridge",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });
    if let Some((lo, hi)) = ridge.range() {
        debug!("ridge range: {lo:.3} .. {hi:.3}");
    }

    // 2. Flow field, sampled at the displaced coordinates
    let t = Instant::now();
    let field = render::field_layer(&inputs, &ridge);
    timings.push(Timing {
        name: "field",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });
    if let Some((lo, hi)) = field.range() {
        debug!("field range: {lo:.3} .. {hi:.3}");
    }

    // 3. Color ramp, ridge shading, grain
    let t = Instant::now();
    let rgba = render::composite_layers(&inputs, &ridge, &field);
    timings.push(Timing {
        name: "composite",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing {
        name: "TOTAL",
        ms: total_ms,
    });
    debug!("generated {}x{} frame at t={time} in {total_ms:.1} ms", surface.width, surface.height);

    let layers = Layers {
        surface,
        time,
        ridge,
        field,
        rgba,
    };

    (layers, timings)
}
