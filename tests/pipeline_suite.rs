use fractalglass::color::{Rgb, color_ramp, hex_to_rgb};
use fractalglass::config::Params;
use fractalglass::field::{FieldVariant, field};
use fractalglass::noise::noise2d;
use fractalglass::render::{FrameInputs, grain, render_frame, shade_pixel};
use fractalglass::ridge::ridge_displacement;
use fractalglass::surface::{LIVE_MAX_PIXEL_RATIO, Surface, Viewport};
use glam::dvec2;

const TOL: f64 = 1e-9;

/// The reference scenario: Neon palette, default glass settings.
fn reference_params(variant: FieldVariant) -> Params {
    let json = r##"{
        "noiseScale": 1.0,
        "displacementStrength": 0.15,
        "lineFrequency": 80,
        "ridgeWaviness": 0.5,
        "animationSpeed": 0.1,
        "grainIntensity": 0.04,
        "contrastBoost": 1.2,
        "colorDark": "#0a0515",
        "colorMid": "#581c87",
        "colorBright": "#ec4899",
        "colorAccent": "#06b6d4"
    }"##;
    Params { variant, ..Params::from_json(json).unwrap() }
}

fn assert_rgb(actual: Rgb, expected: [f64; 3]) {
    let got = [actual.r, actual.g, actual.b];
    for (a, e) in got.iter().zip(expected) {
        assert!((a - e).abs() < TOL, "got {got:?}, expected {expected:?}");
    }
}

// ── Pinned fixtures ─────────────────────────────────────────────────────────

#[test]
fn reference_pixel_simple_variant() {
    let params = reference_params(FieldVariant::Simple);
    let surface = Surface::new(1600, 1200);
    let uv = dvec2(0.5, 0.5);

    let s = FrameInputs::new(surface, 0.0, &params).sample(uv);
    assert!((s.ridge - -0.18947301159345348).abs() < TOL, "{}", s.ridge);
    assert!((s.field - 0.280812389183298).abs() < TOL, "{}", s.field);
    assert_rgb(
        shade_pixel(uv, surface, 0.0, &params),
        [0.2743230319148274, 0.08106763353160772, 0.429645228236899],
    );
}

#[test]
fn reference_pixel_rich_variant() {
    let params = reference_params(FieldVariant::Rich);
    assert_rgb(
        shade_pixel(dvec2(0.5, 0.5), Surface::new(1600, 1200), 0.0, &params),
        [0.5351378113516329, 0.41807712329893537, 0.6460449138333739],
    );
    assert_rgb(
        shade_pixel(dvec2(0.3, 0.7), Surface::new(800, 600), 5.0, &params),
        [0.5867993499830183, 0.4490493855763342, 0.6893358689967937],
    );
}

#[test]
fn reference_pixel_animated_simple_variant() {
    let params = reference_params(FieldVariant::Simple);
    assert_rgb(
        shade_pixel(dvec2(0.3, 0.7), Surface::new(800, 600), 5.0, &params),
        [0.4360339645541234, 0.5211545699118926, 0.7280104678676842],
    );
}

#[test]
fn reference_grain_value() {
    let g = grain(dvec2(0.5, 0.5), dvec2(1600.0, 1200.0), 0.0, 0.04);
    assert!((g - -0.012759004530817037).abs() < TOL, "{g}");
}

// ── Properties ──────────────────────────────────────────────────────────────

#[test]
fn field_in_unit_interval_for_all_pixels() {
    for variant in FieldVariant::ALL {
        let params = Params { variant, displacement_strength: 0.4, ..Params::default() };
        let surface = Surface::new(32, 24);
        for time in [0.0, 7.5, 300.0] {
            let inputs = FrameInputs::new(surface, time, &params);
            for row in 0..surface.height {
                for x in 0..surface.width {
                    let f = inputs.sample(surface.uv(x, row)).field;
                    assert!((0.0..=1.0).contains(&f));
                }
            }
        }
    }
}

#[test]
fn field_is_sampled_after_displacement() {
    for variant in FieldVariant::ALL {
        let params = reference_params(variant);
        let surface = Surface::new(1600, 1200);
        let uv = dvec2(0.5, 0.5);
        let time = 0.0;

        let ridge = ridge_displacement(uv, time, &params);
        assert!(ridge.abs() > 1e-3);

        let aspect = surface.aspect();
        let displaced = field(dvec2(uv.x * aspect, uv.y + ridge * params.displacement_strength), time, &params);
        let undisplaced = field(dvec2(uv.x * aspect, uv.y), time, &params);
        assert!((displaced - undisplaced).abs() > 1e-3);

        let sampled = FrameInputs::new(surface, time, &params).sample(uv).field;
        assert_eq!(sampled, displaced, "{variant:?}");
    }
}

#[test]
fn zero_strength_means_no_displacement() {
    let params = Params { displacement_strength: 0.0, ..reference_params(FieldVariant::Simple) };
    let surface = Surface::new(400, 300);
    let uv = dvec2(0.2, 0.9);
    let sampled = FrameInputs::new(surface, 1.0, &params).sample(uv).field;
    assert_eq!(sampled, field(dvec2(uv.x * surface.aspect(), uv.y), 1.0, &params));
}

#[test]
fn noise_is_repeatable() {
    let p = dvec2(3.7, -1.2);
    let first = noise2d(p);
    for _ in 0..10 {
        assert_eq!(noise2d(p).to_bits(), first.to_bits());
    }
}

#[test]
fn grain_is_repeatable() {
    let a = grain(dvec2(0.25, 0.75), dvec2(1920.0, 1080.0), 12.5, 0.04);
    let b = grain(dvec2(0.25, 0.75), dvec2(1920.0, 1080.0), 12.5, 0.04);
    assert_eq!(a.to_bits(), b.to_bits());
    assert!(a.abs() <= 0.02);
}

#[test]
fn ramp_endpoints_match_control_colors() {
    let params = Params::default();
    let palette = params.palette();
    let close = |a: Rgb, b: Rgb| (a.r - b.r).abs() < TOL && (a.g - b.g).abs() < TOL && (a.b - b.b).abs() < TOL;
    assert!(close(color_ramp(0.0, &palette), params.color_dark));
    assert!(close(color_ramp(0.33, &palette), params.color_mid));
    assert!(close(color_ramp(1.0, &palette), params.color_accent));
}

#[test]
fn hex_parsing_contract() {
    assert_eq!(hex_to_rgb("#581c87"), Rgb::new(88.0 / 255.0, 28.0 / 255.0, 135.0 / 255.0));
    assert_eq!(hex_to_rgb("invalid"), Rgb::new(1.0, 0.0, 1.0));
}

#[test]
fn render_is_deterministic_and_varies_over_time() {
    let params = Params::default();
    let surface = Surface::new(40, 30);
    let a = render_frame(surface, 2.0, &params);
    assert_eq!(a, render_frame(surface, 2.0, &params));
    assert_ne!(a, render_frame(surface, 40.0, &params));
}

#[test]
fn garbage_params_still_render() {
    let mut params = Params {
        noise_scale: -3.0,
        contrast_boost: 0.0,
        line_frequency: f64::INFINITY,
        grain_intensity: f64::NAN,
        ..Params::default()
    };
    params.sanitize();
    let rgba = render_frame(Surface::new(16, 16), 1.0, &params);
    assert_eq!(rgba.len(), 16 * 16 * 4);
}

#[test]
fn retina_resize_scenario() {
    let surface = Viewport::new(800, 600, 2.0).surface(LIVE_MAX_PIXEL_RATIO);
    assert_eq!((surface.width, surface.height), (1600, 1200));
    assert_eq!(surface.resolution(), dvec2(1600.0, 1200.0));
}

#[test]
fn oversized_viewport_renders_at_clamped_size() {
    let surface = Viewport::new(u32::MAX, 1, 1.0).surface(LIVE_MAX_PIXEL_RATIO);
    assert_eq!((surface.width, surface.height), (fractalglass::surface::MAX_SURFACE_SIDE, 1));
    let rgba = render_frame(surface, 0.0, &Params::default());
    assert_eq!(Some(rgba.len()), surface.rgba_len());
}
