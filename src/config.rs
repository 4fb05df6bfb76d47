use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::{Palette, Preset, Rgb, hex_to_rgb};
use crate::error::Result;
use crate::field::FieldVariant;

/// Smallest value accepted for parameters whose domain is strictly positive.
pub const MIN_POSITIVE: f64 = 1e-4;

/// All tunable parameters. Key names match what the settings surface sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Params {
    pub variant: FieldVariant,

    // Flow
    pub noise_scale: f64,
    pub animation_speed: f64,
    pub contrast_boost: f64,
    pub wave_complexity: f64,
    pub flow_intensity: f64,

    // Glass
    pub displacement_strength: f64,
    pub line_frequency: f64,
    pub ridge_waviness: f64,
    pub grain_intensity: f64,

    // Color
    pub color_dark: Rgb,
    pub color_mid: Rgb,
    pub color_bright: Rgb,
    pub color_accent: Rgb,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            variant: FieldVariant::Simple,
            noise_scale: 1.0,
            animation_speed: 0.1,
            contrast_boost: 1.2,
            wave_complexity: 1.0,
            flow_intensity: 1.0,
            displacement_strength: 0.15,
            line_frequency: 80.0,
            ridge_waviness: 0.5,
            grain_intensity: 0.04,
            color_dark: hex_to_rgb("#0a0515"),
            color_mid: hex_to_rgb("#581c87"),
            color_bright: hex_to_rgb("#ec4899"),
            color_accent: hex_to_rgb("#06b6d4"),
        }
    }
}

/// Declared domain of a numeric parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Domain {
    Positive,
    NonNegative,
}

impl Domain {
    fn floor(self) -> f64 {
        match self {
            Domain::Positive => MIN_POSITIVE,
            Domain::NonNegative => 0.0,
        }
    }
}

/// Slider bounds the settings surface presents. Informational only;
/// `Params::sanitize` enforces the domains, not these.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderRange {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const SLIDERS: [SliderRange; 9] = [
    SliderRange { key: "waveComplexity", label: "Wave Complexity", min: 0.3, max: 2.0, step: 0.1 },
    SliderRange { key: "flowIntensity", label: "Flow Warp", min: 0.0, max: 2.0, step: 0.1 },
    SliderRange { key: "noiseScale", label: "Pattern Scale", min: 0.3, max: 2.0, step: 0.1 },
    SliderRange { key: "animationSpeed", label: "Flow Speed", min: 0.02, max: 0.3, step: 0.02 },
    SliderRange { key: "contrastBoost", label: "Dark Valleys", min: 0.5, max: 1.5, step: 0.05 },
    SliderRange { key: "displacementStrength", label: "Ridge Depth", min: 0.02, max: 0.4, step: 0.01 },
    SliderRange { key: "lineFrequency", label: "Ridge Count", min: 20.0, max: 200.0, step: 5.0 },
    SliderRange { key: "ridgeWaviness", label: "Ridge Waviness", min: 0.0, max: 1.5, step: 0.05 },
    SliderRange { key: "grainIntensity", label: "Film Grain", min: 0.0, max: 0.12, step: 0.005 },
];

fn sanitize_value(name: &str, value: &mut f64, fallback: f64, domain: Domain) {
    let fixed = if !value.is_finite() {
        fallback
    } else {
        value.max(domain.floor())
    };
    if fixed != *value {
        warn!("{name} = {value} is outside its domain, using {fixed}");
        *value = fixed;
    }
}

fn sanitize_color(name: &str, color: &mut Rgb) {
    let fixed = if color.is_finite() { color.clamp01() } else { crate::color::MAGENTA };
    if fixed != *color {
        warn!("{name} has components outside [0, 1], clamping");
        *color = fixed;
    }
}

impl Params {
    pub fn palette(&self) -> Palette {
        Palette {
            dark: self.color_dark,
            mid: self.color_mid,
            bright: self.color_bright,
            accent: self.color_accent,
        }
    }

    /// Clamp every field into its declared domain. Non-finite values fall
    /// back to the default. Called at every entry point that accepts
    /// outside input; the shading functions assume it has run.
    pub fn sanitize(&mut self) {
        use Domain::*;
        let d = Params::default();
        sanitize_value("noiseScale", &mut self.noise_scale, d.noise_scale, Positive);
        sanitize_value("animationSpeed", &mut self.animation_speed, d.animation_speed, NonNegative);
        sanitize_value("contrastBoost", &mut self.contrast_boost, d.contrast_boost, Positive);
        sanitize_value("waveComplexity", &mut self.wave_complexity, d.wave_complexity, Positive);
        sanitize_value("flowIntensity", &mut self.flow_intensity, d.flow_intensity, NonNegative);
        sanitize_value(
            "displacementStrength",
            &mut self.displacement_strength,
            d.displacement_strength,
            NonNegative,
        );
        sanitize_value("lineFrequency", &mut self.line_frequency, d.line_frequency, Positive);
        sanitize_value("ridgeWaviness", &mut self.ridge_waviness, d.ridge_waviness, NonNegative);
        sanitize_value("grainIntensity", &mut self.grain_intensity, d.grain_intensity, NonNegative);
        sanitize_color("colorDark", &mut self.color_dark);
        sanitize_color("colorMid", &mut self.color_mid);
        sanitize_color("colorBright", &mut self.color_bright);
        sanitize_color("colorAccent", &mut self.color_accent);
    }

    pub fn apply(&mut self, patch: &ParamsPatch) {
        patch.apply(self);
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        self.apply(&ParamsPatch::from_preset(preset));
    }

    /// Parse a full or partial parameter set from JSON, on top of defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let patch: ParamsPatch = serde_json::from_str(json)?;
        let mut params = Params::default();
        params.apply(&patch);
        Ok(params)
    }
}

/// Partial update: only the keys present are changed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<FieldVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_complexity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ridge_waviness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grain_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_dark: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mid: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_bright: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_accent: Option<Rgb>,
}

impl ParamsPatch {
    pub fn from_preset(preset: &Preset) -> Self {
        let p = preset.palette();
        Self {
            color_dark: Some(p.dark),
            color_mid: Some(p.mid),
            color_bright: Some(p.bright),
            color_accent: Some(p.accent),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, params: &mut Params) {
        macro_rules! set {
            ($($f:ident),*) => { $( if let Some(v) = self.$f { params.$f = v; } )* };
        }
        set!(
            variant, noise_scale, animation_speed, contrast_boost, wave_complexity,
            flow_intensity, displacement_strength, line_frequency, ridge_waviness,
            grain_intensity, color_dark, color_mid, color_bright, color_accent
        );
        params.sanitize();
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_domain() {
        let mut p = Params::default();
        let before = p.clone();
        p.sanitize();
        assert_eq!(p, before);
    }

    #[test]
    fn partial_update_keeps_other_keys() {
        let mut p = Params::default();
        let patch: ParamsPatch =
            serde_json::from_str(r##"{"lineFrequency": 120, "colorMid": "#ffffff"}"##).unwrap();
        p.apply(&patch);
        assert_eq!(p.line_frequency, 120.0);
        assert_eq!(p.color_mid, Rgb::splat(1.0));
        assert_eq!(p.noise_scale, 1.0);
        assert_eq!(p.color_dark, Params::default().color_dark);
    }

    #[test]
    fn out_of_domain_values_are_clamped() {
        let mut p = Params::default();
        p.apply(&ParamsPatch {
            noise_scale: Some(-2.0),
            grain_intensity: Some(-0.5),
            contrast_boost: Some(f64::NAN),
            ..ParamsPatch::default()
        });
        assert_eq!(p.noise_scale, MIN_POSITIVE);
        assert_eq!(p.grain_intensity, 0.0);
        assert_eq!(p.contrast_boost, 1.2);
    }

    #[test]
    fn malformed_color_in_patch_becomes_magenta() {
        let p = Params::from_json(r#"{"colorAccent": "teal"}"#).unwrap();
        assert_eq!(p.color_accent, crate::color::MAGENTA);
    }

    #[test]
    fn preset_only_touches_colors() {
        let mut p = Params { line_frequency: 150.0, ..Params::default() };
        p.apply_preset(Preset::find("Ocean").unwrap());
        assert_eq!(p.line_frequency, 150.0);
        assert_eq!(p.color_bright.to_hex(), "#3b82f6");
    }

    #[test]
    fn params_json_uses_external_names() {
        let json = serde_json::to_value(Params::default()).unwrap();
        assert_eq!(json["lineFrequency"], 80.0);
        assert_eq!(json["colorDark"], "#0a0515");
        assert_eq!(json["variant"], "simple");
    }

    #[test]
    fn variant_is_selectable_from_json() {
        let p = Params::from_json(r#"{"variant": "rich", "flowIntensity": 0.4}"#).unwrap();
        assert_eq!(p.variant, FieldVariant::Rich);
        assert_eq!(p.flow_intensity, 0.4);
    }
}
