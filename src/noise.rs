use glam::{DVec2, dvec2};

// Simplex skew constants: (3 - sqrt(3)) / 6, (sqrt(3) - 1) / 2, -1 + 2 * C0, 1 / 41.
const C0: f64 = 0.211324865405187;
const C1: f64 = 0.366025403784439;
const C2: f64 = -0.577350269189626;
const C3: f64 = 0.024390243902439;

#[inline]
pub fn fract(x: f64) -> f64 {
    x - x.floor()
}

#[inline]
pub fn mix(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Hermite S-curve over [edge0, edge1], clamped like the shader builtin.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn mod289(x: f64) -> f64 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

/// Permutation polynomial (34x^2 + x) mod 289. Stands in for a lookup
/// table so the lattice hash is a pure function of the integer corner.
#[inline]
fn permute(x: f64) -> f64 {
    mod289((x * 34.0 + 1.0) * x)
}

/// 2D simplex noise, roughly in [-1, 1].
///
/// The lattice period is 289 cells, far outside any coordinate the
/// pipeline samples.
pub fn noise2d(v: DVec2) -> f64 {
    // Skew into simplex space and find the base corner.
    let s = (v.x + v.y) * C1;
    let i = dvec2((v.x + s).floor(), (v.y + s).floor());
    let t = (i.x + i.y) * C0;
    let x0 = v - i + t;

    // Which of the two triangles in the skewed cell.
    let i1 = if x0.x > x0.y { dvec2(1.0, 0.0) } else { dvec2(0.0, 1.0) };
    let x1 = x0 + C0 - i1;
    let x2 = x0 + C2;

    let i = dvec2(mod289(i.x), mod289(i.y));
    let p = [
        permute(permute(i.y) + i.x),
        permute(permute(i.y + i1.y) + i.x + i1.x),
        permute(permute(i.y + 1.0) + i.x + 1.0),
    ];

    let corners = [x0, x1, x2];
    let mut sum = 0.0;
    for (c, &h) in corners.iter().zip(p.iter()) {
        let m = (0.5 - c.dot(*c)).max(0.0);
        let m = m * m;
        let m = m * m;

        // 41 gradients spread over a rotated cross-polytope.
        let gx = 2.0 * fract(h * C3) - 1.0;
        let gy = gx.abs() - 0.5;
        let ox = (gx + 0.5).floor();
        let a0 = gx - ox;

        // Normalise gradients implicitly by scaling m.
        let m = m * (1.79284291400159 - 0.85373472095314 * (a0 * a0 + gy * gy));
        sum += m * (a0 * c.x + gy * c.y);
    }
    130.0 * sum
}

/// Three octaves of simplex noise, amplitude halving and frequency doubling.
/// `time` is added to both components of every octave's sample point.
pub fn fbm(p: DVec2, time: f64) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    for _ in 0..3 {
        value += amplitude * noise2d(p * frequency + time);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic() {
        let pts = [dvec2(0.3, 0.7), dvec2(-12.5, 4.25), dvec2(100.1, -0.01)];
        for p in pts {
            assert_eq!(noise2d(p).to_bits(), noise2d(p).to_bits());
        }
    }

    #[test]
    fn noise_stays_in_unit_range() {
        for iy in 0..64 {
            for ix in 0..64 {
                let p = dvec2(ix as f64 * 0.173 - 5.0, iy as f64 * 0.219 - 7.0);
                let n = noise2d(p);
                assert!(n.is_finite());
                assert!(n.abs() <= 1.05, "noise out of range at {p}: {n}");
            }
        }
    }

    #[test]
    fn noise_vanishes_on_lattice_corner() {
        assert!(noise2d(DVec2::ZERO).abs() < 1e-12);
    }

    #[test]
    fn noise_is_continuous() {
        let p = dvec2(1.234, 5.678);
        let d = noise2d(p) - noise2d(p + dvec2(1e-6, 1e-6));
        assert!(d.abs() < 1e-3);
    }

    #[test]
    fn fbm_is_bounded_by_amplitude_sum() {
        for i in 0..200 {
            let p = dvec2(i as f64 * 0.37, i as f64 * -0.11);
            assert!(fbm(p, i as f64 * 0.05).abs() <= 0.875 * 1.05);
        }
    }

    #[test]
    fn smoothstep_clamps() {
        assert_eq!(smoothstep(0.0, 1.0, -0.5), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 1.5), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }
}
