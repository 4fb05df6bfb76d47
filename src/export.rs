//! Standalone wallpaper export: a single HTML file that re-creates the
//! pipeline in WebGL with the current parameters baked in.
//!
//! The GLSL below mirrors `noise`, `field`, `ridge`, `color` and `render`
//! formula for formula. Change them together.

use std::fmt::Write as _;
use std::path::Path;

use log::info;

use crate::config::Params;
use crate::error::Result;
use crate::field::FieldVariant;
use crate::surface::EXPORT_MAX_PIXEL_RATIO;

pub const EXPORT_FILENAME: &str = "fractal-glass-wallpaper.html";

const UNIFORMS_GLSL: &str = r#"      precision highp float;
      varying vec2 v_texCoord;
      uniform float u_time;
      uniform vec2 u_resolution;
      uniform float u_noiseScale;
      uniform float u_displacementStrength;
      uniform float u_lineFrequency;
      uniform float u_ridgeWaviness;
      uniform float u_animationSpeed;
      uniform float u_grainIntensity;
      uniform float u_contrastBoost;
      uniform float u_waveComplexity;
      uniform float u_flowIntensity;
      uniform vec3 u_colorDark;
      uniform vec3 u_colorMid;
      uniform vec3 u_colorBright;
      uniform vec3 u_colorAccent;
"#;

const NOISE_GLSL: &str = r#"
      vec3 mod289(vec3 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
      vec2 mod289(vec2 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
      vec3 permute(vec3 x) { return mod289(((x*34.0)+1.0)*x); }

      float snoise(vec2 v) {
        const vec4 C = vec4(0.211324865405187, 0.366025403784439, -0.577350269189626, 0.024390243902439);
        vec2 i = floor(v + dot(v, C.yy));
        vec2 x0 = v - i + dot(i, C.xx);
        vec2 i1 = (x0.x > x0.y) ? vec2(1.0, 0.0) : vec2(0.0, 1.0);
        vec4 x12 = x0.xyxy + C.xxzz;
        x12.xy -= i1;
        i = mod289(i);
        vec3 p = permute(permute(i.y + vec3(0.0, i1.y, 1.0)) + i.x + vec3(0.0, i1.x, 1.0));
        vec3 m = max(0.5 - vec3(dot(x0,x0), dot(x12.xy,x12.xy), dot(x12.zw,x12.zw)), 0.0);
        m = m*m; m = m*m;
        vec3 x = 2.0 * fract(p * C.www) - 1.0;
        vec3 h = abs(x) - 0.5;
        vec3 ox = floor(x + 0.5);
        vec3 a0 = x - ox;
        m *= 1.79284291400159 - 0.85373472095314 * (a0*a0 + h*h);
        vec3 g;
        g.x = a0.x * x0.x + h.x * x0.y;
        g.yz = a0.yz * x12.xz + h.yz * x12.yw;
        return 130.0 * dot(m, g);
      }

      float fbm(vec2 p, float t) {
        float value = 0.0;
        float amplitude = 0.5;
        float frequency = 1.0;
        for (int i = 0; i < 3; i++) {
          value += amplitude * snoise(p * frequency + t);
          amplitude *= 0.5;
          frequency *= 2.0;
        }
        return value;
      }
"#;

const SIMPLE_FIELD_GLSL: &str = r#"
      float getGradientField(vec2 uv, float time) {
        float t = time * u_animationSpeed;
        float flow = snoise(vec2(uv.x * 0.8, uv.y * 2.5) * u_noiseScale + vec2(t * 0.15, t * 0.3));
        flow += 0.6 * snoise(vec2(uv.x * 1.2, uv.y * 1.8) * u_noiseScale + vec2(-t * 0.2, t * 0.15));
        flow += 0.3 * snoise(vec2(uv.x * 2.0, uv.y * 0.8) * u_noiseScale + vec2(t * 0.1, -t * 0.2));
        flow = flow * 0.35 + 0.5;
        flow = smoothstep(0.0, 1.0, flow);
        flow = pow(flow, u_contrastBoost);
        return clamp(flow, 0.0, 1.0);
      }
"#;

const RICH_FIELD_GLSL: &str = r#"
      float getGradientField(vec2 uv, float time) {
        float t = time * u_animationSpeed;
        vec2 p = uv * u_noiseScale;
        vec2 toCenter = uv - vec2(0.5, 0.5);
        float dist = length(toCenter);
        float angle = atan(toCenter.y, toCenter.x);
        float swirlSpeed = sin(t * 0.15) * 0.5 + 0.5;
        float swirlAngle = angle + dist * 2.0 * swirlSpeed * sin(t * 0.2);
        vec2 swirlOffset = vec2(cos(swirlAngle), sin(swirlAngle)) * dist * 0.3 * u_flowIntensity;
        float warpAngle = t * 0.1;
        vec2 warpDir1 = vec2(cos(warpAngle), sin(warpAngle));
        vec2 warpDir2 = vec2(cos(warpAngle + 2.094), sin(warpAngle + 2.094));
        vec2 warp = vec2(fbm(p * 0.8 + warpDir1 * t * 0.2, t * 0.2), fbm(p * 0.8 + warpDir2 * t * 0.15, t * 0.15));
        p += warp * u_flowIntensity * 0.35;
        p += swirlOffset * 0.2;
        float speedPulse1 = sin(t * 0.08) * 0.4 + 1.0;
        float speedPulse2 = sin(t * 0.12 + 1.5) * 0.3 + 1.0;
        float waves = 0.0;
        float angle1 = 0.7 + sin(t * 0.05) * 0.3;
        vec2 dir1 = vec2(cos(angle1), sin(angle1));
        waves += sin(dot(p, dir1) * 3.0 * u_waveComplexity + t * 1.2 * speedPulse1 + fbm(p * 2.0, t) * 2.0) * 0.35;
        float angle2 = 2.4 - sin(t * 0.07) * 0.4;
        vec2 dir2 = vec2(cos(angle2), sin(angle2));
        waves += sin(dot(p, dir2) * 2.5 * u_waveComplexity - t * 1.0 * speedPulse2 + fbm(p * 1.5 + 10.0, t) * 1.5) * 0.3;
        float verticalShift = sin(t * 0.09) * 0.5;
        waves += sin((p.y + p.x * 0.3 * verticalShift) * 2.8 * u_waveComplexity + t * 0.8) * 0.2;
        vec2 waveCenter = vec2(0.5 + sin(t * 0.1) * 0.3, 0.5 + cos(t * 0.08) * 0.3);
        float radialDist = length(p / u_noiseScale - waveCenter);
        waves += sin(radialDist * 4.0 * u_waveComplexity - t * 0.5) * 0.15;
        float field = waves * 0.45 + 0.5;
        field += fbm(p * 3.0 + vec2(t * 0.15, -t * 0.12), t * 0.3) * 0.1;
        field += sin(t * 0.18) * 0.04 + sin(t * 0.07) * 0.03;
        field += snoise(uv * 2.0 + vec2(sin(t * 0.1), cos(t * 0.12)) * 0.5) * 0.06;
        field = field * 0.7 + 0.3;
        field = clamp(field, 0.0, 1.0);
        field = smoothstep(0.0, 1.0, field);
        field = pow(field, u_contrastBoost);
        return clamp(field, 0.0, 1.0);
      }
"#;

const SHADING_GLSL: &str = r#"
      float getRidgeDisplacement(vec2 uv, float time) {
        float t = time * u_animationSpeed * 0.5;
        float ridgeX = uv.x * u_lineFrequency;
        ridgeX += snoise(vec2(uv.x * 3.0, uv.y * 8.0 + t)) * u_ridgeWaviness * 0.3;
        float ridge = sin(ridgeX * 6.28318);
        float yVariation = snoise(vec2(uv.x * 5.0, uv.y * 2.0 + t * 0.3)) * 0.3;
        return ridge * (1.0 + yVariation);
      }

      vec3 colorRamp(float n) {
        if (n < 0.33) return mix(u_colorDark, u_colorMid, n / 0.33);
        if (n < 0.66) return mix(u_colorMid, u_colorBright, (n - 0.33) / 0.33);
        return mix(u_colorBright, u_colorAccent, (n - 0.66) / 0.34);
      }

      float random(vec2 st, float seed) {
        return fract(sin(dot(st + seed, vec2(12.9898, 78.233))) * 43758.5453);
      }

      void main() {
        vec2 uv = v_texCoord;
        float time = u_time;
        float aspect = u_resolution.x / u_resolution.y;
        float ridgeOffset = getRidgeDisplacement(uv, time);
        vec2 displacedUV = uv;
        displacedUV.y += ridgeOffset * u_displacementStrength;
        vec2 gradientUV = vec2(displacedUV.x * aspect, displacedUV.y);
        float gradientValue = getGradientField(gradientUV, time);
        vec3 color = colorRamp(gradientValue);
        float ridgeShading = ridgeOffset * 0.5 + 0.5;
        color *= mix(0.85, 1.1, ridgeShading);
        color += vec3(pow(max(ridgeShading, 0.0), 4.0) * 0.08);
        color += vec3((random(uv * u_resolution, time * 10.0) - 0.5) * u_grainIntensity);
        gl_FragColor = vec4(clamp(color, 0.0, 1.0), 1.0);
      }
"#;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Fractal Glass Wallpaper</title>
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    html, body { width: 100%; height: 100%; overflow: hidden; background: @BACKGROUND@; }
    canvas { display: block; width: 100%; height: 100%; }
  </style>
</head>
<body>
  <canvas id="canvas"></canvas>
  <script>
    const CONFIG = {
@CONFIG@    };

    function hexToRgb(hex) {
      const result = /^#?([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})$/i.exec(hex);
      return result ? [
        parseInt(result[1], 16) / 255,
        parseInt(result[2], 16) / 255,
        parseInt(result[3], 16) / 255,
      ] : [1, 0, 1];
    }

    const vertexShaderSource = `
      attribute vec2 a_position;
      attribute vec2 a_texCoord;
      varying vec2 v_texCoord;
      void main() {
        gl_Position = vec4(a_position, 0.0, 1.0);
        v_texCoord = a_texCoord;
      }
    `;

    const fragmentShaderSource = `
@FRAGMENT@    `;

    function createShader(gl, type, source) {
      const shader = gl.createShader(type);
      gl.shaderSource(shader, source);
      gl.compileShader(shader);
      if (!gl.getShaderParameter(shader, gl.COMPILE_STATUS)) {
        console.error('Shader error:', gl.getShaderInfoLog(shader));
        gl.deleteShader(shader);
        return null;
      }
      return shader;
    }

    function createProgram(gl, vs, fs) {
      const program = gl.createProgram();
      gl.attachShader(program, vs);
      gl.attachShader(program, fs);
      gl.linkProgram(program);
      if (!gl.getProgramParameter(program, gl.LINK_STATUS)) {
        console.error('Program error:', gl.getProgramInfoLog(program));
        return null;
      }
      return program;
    }

    const canvas = document.getElementById('canvas');
    const gl = canvas.getContext('webgl', { antialias: false, alpha: false });
    if (!gl) {
      throw new Error('WebGL not supported');
    }
    const vs = createShader(gl, gl.VERTEX_SHADER, vertexShaderSource);
    const fs = createShader(gl, gl.FRAGMENT_SHADER, fragmentShaderSource);
    const program = vs && fs ? createProgram(gl, vs, fs) : null;
    if (!program) {
      throw new Error('Fractal glass shader failed to build');
    }
    gl.useProgram(program);

    const positions = new Float32Array([-1,-1, 1,-1, -1,1, -1,1, 1,-1, 1,1]);
    const texCoords = new Float32Array([0,0, 1,0, 0,1, 0,1, 1,0, 1,1]);

    const posBuffer = gl.createBuffer();
    gl.bindBuffer(gl.ARRAY_BUFFER, posBuffer);
    gl.bufferData(gl.ARRAY_BUFFER, positions, gl.STATIC_DRAW);
    const posLoc = gl.getAttribLocation(program, 'a_position');
    gl.enableVertexAttribArray(posLoc);
    gl.vertexAttribPointer(posLoc, 2, gl.FLOAT, false, 0, 0);

    const texBuffer = gl.createBuffer();
    gl.bindBuffer(gl.ARRAY_BUFFER, texBuffer);
    gl.bufferData(gl.ARRAY_BUFFER, texCoords, gl.STATIC_DRAW);
    const texLoc = gl.getAttribLocation(program, 'a_texCoord');
    gl.enableVertexAttribArray(texLoc);
    gl.vertexAttribPointer(texLoc, 2, gl.FLOAT, false, 0, 0);

    const loc = (name) => gl.getUniformLocation(program, name);
    const u = {
      time: loc('u_time'),
      resolution: loc('u_resolution'),
    };

    gl.uniform1f(loc('u_noiseScale'), CONFIG.noiseScale);
    gl.uniform1f(loc('u_displacementStrength'), CONFIG.displacementStrength);
    gl.uniform1f(loc('u_lineFrequency'), CONFIG.lineFrequency);
    gl.uniform1f(loc('u_ridgeWaviness'), CONFIG.ridgeWaviness);
    gl.uniform1f(loc('u_animationSpeed'), CONFIG.animationSpeed);
    gl.uniform1f(loc('u_grainIntensity'), CONFIG.grainIntensity);
    gl.uniform1f(loc('u_contrastBoost'), CONFIG.contrastBoost);
    gl.uniform1f(loc('u_waveComplexity'), CONFIG.waveComplexity);
    gl.uniform1f(loc('u_flowIntensity'), CONFIG.flowIntensity);
    gl.uniform3fv(loc('u_colorDark'), hexToRgb(CONFIG.colorDark));
    gl.uniform3fv(loc('u_colorMid'), hexToRgb(CONFIG.colorMid));
    gl.uniform3fv(loc('u_colorBright'), hexToRgb(CONFIG.colorBright));
    gl.uniform3fv(loc('u_colorAccent'), hexToRgb(CONFIG.colorAccent));

    function resize() {
      const dpr = Math.min(window.devicePixelRatio, @MAX_DPR@);
      canvas.width = window.innerWidth * dpr;
      canvas.height = window.innerHeight * dpr;
      canvas.style.width = window.innerWidth + 'px';
      canvas.style.height = window.innerHeight + 'px';
      gl.viewport(0, 0, canvas.width, canvas.height);
      gl.uniform2f(u.resolution, canvas.width, canvas.height);
    }
    resize();
    window.addEventListener('resize', resize);

    const startTime = performance.now();
    function render() {
      gl.uniform1f(u.time, (performance.now() - startTime) / 1000);
      gl.drawArrays(gl.TRIANGLES, 0, 6);
      requestAnimationFrame(render);
    }
    render();
  </script>
</body>
</html>
"#;

/// Fragment shader source for a variant.
pub fn fragment_shader(variant: FieldVariant) -> String {
    let field = match variant {
        FieldVariant::Simple => SIMPLE_FIELD_GLSL,
        FieldVariant::Rich => RICH_FIELD_GLSL,
    };
    [UNIFORMS_GLSL, NOISE_GLSL, field, SHADING_GLSL].concat()
}

fn config_literal(params: &Params) -> String {
    let mut out = String::new();
    let numbers = [
        ("noiseScale", params.noise_scale),
        ("displacementStrength", params.displacement_strength),
        ("lineFrequency", params.line_frequency),
        ("ridgeWaviness", params.ridge_waviness),
        ("animationSpeed", params.animation_speed),
        ("grainIntensity", params.grain_intensity),
        ("contrastBoost", params.contrast_boost),
        ("waveComplexity", params.wave_complexity),
        ("flowIntensity", params.flow_intensity),
    ];
    for (key, value) in numbers {
        let _ = writeln!(out, "      {key}: {value},");
    }
    let colors = [
        ("colorDark", params.color_dark),
        ("colorMid", params.color_mid),
        ("colorBright", params.color_bright),
        ("colorAccent", params.color_accent),
    ];
    for (key, color) in colors {
        let _ = writeln!(out, "      {key}: \"{}\",", color.to_hex());
    }
    out
}

/// Self-contained wallpaper page for `params`, using `params.variant`.
pub fn export_html(params: &Params) -> String {
    export_html_with(params, params.variant)
}

/// Same as `export_html` with an explicit field variant.
pub fn export_html_with(params: &Params, variant: FieldVariant) -> String {
    let mut params = params.clone();
    params.sanitize();
    PAGE_TEMPLATE
        .replace("@BACKGROUND@", &params.color_dark.to_hex())
        .replace("@CONFIG@", &config_literal(&params))
        .replace("@FRAGMENT@", &fragment_shader(variant))
        .replace("@MAX_DPR@", &EXPORT_MAX_PIXEL_RATIO.to_string())
}

pub fn write_html(path: &Path, params: &Params, variant: FieldVariant) -> Result<()> {
    std::fs::write(path, export_html_with(params, variant))?;
    info!("Exported {} wallpaper to {}", variant.name(), path.display());
    Ok(())
}
