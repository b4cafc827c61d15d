//! Vertical displacement of a line at a horizontal offset.
//!
//! The base waveform superposes a primary sinusoid with a half-frequency,
//! half-amplitude cosine so the motion never looks strictly periodic. When
//! interaction is on, points within `Bend::radius` of the pointer are pushed
//! along the pointer-to-point angle with a smoothstep falloff, which has zero
//! slope at both ends of the radius.

use glam::Vec2;

use crate::model::WaveLine;

/// Pointer influence parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bend {
    pub radius: f32,
    pub strength: f32,
}

/// Cubic ease `t²(3 - 2t)`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Samples lines for one frame against a fixed pointer snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSampler {
    bend: Option<Bend>,
    pointer: Vec2,
}

impl FieldSampler {
    /// `bend` is `None` when interaction is disabled; the pointer is then ignored.
    pub fn new(bend: Option<Bend>, pointer: Vec2) -> Self {
        Self { bend, pointer }
    }

    pub fn sample(&self, line: &WaveLine, x: f32) -> f32 {
        let y = base_waveform(line, x);
        match self.bend {
            Some(bend) => y + deflection(Vec2::new(x, y), self.pointer, bend),
            None => y,
        }
    }
}

pub fn base_waveform(line: &WaveLine, x: f32) -> f32 {
    let (amplitude, frequency, phase) = (line.amplitude(), line.frequency(), line.phase());
    line.baseline_y()
        + (x * frequency + phase).sin() * amplitude
        + (x * frequency * 0.5 + phase * 0.5).cos() * (amplitude * 0.5)
}

/// Eased proximity in `[0, 1]`; zero at or beyond the radius.
pub fn proximity(distance: f32, radius: f32) -> f32 {
    if distance < radius {
        smoothstep((radius - distance) / radius)
    } else {
        0.0
    }
}

/// Vertical push applied to `point` by a pointer at `pointer`.
///
/// A pointer exactly on the point resolves to `atan2(0, 0) = 0`, so the
/// push is `sin(0) = 0` even though the ease is at its maximum.
pub fn deflection(point: Vec2, pointer: Vec2, bend: Bend) -> f32 {
    let delta = point - pointer;
    let ease = proximity(delta.length(), bend.radius);
    if ease == 0.0 {
        return 0.0;
    }
    let angle = delta.y.atan2(delta.x);
    angle.sin() * ease * bend.radius * bend.strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use floatlines_platform::Color;
    use rstest::rstest;

    fn line(phase: f32) -> WaveLine {
        WaveLine::new(300.0, 120.0, 0.002, phase, 0.02, Color::WHITE, 60.0)
    }

    const BEND: Bend = Bend {
        radius: 400.0,
        strength: 0.2,
    };

    #[test]
    fn base_waveform_is_deterministic() {
        let sampler = FieldSampler::new(None, Vec2::ZERO);
        let line = line(0.7);
        assert_eq!(sampler.sample(&line, 431.0), sampler.sample(&line, 431.0));
    }

    #[test]
    fn base_waveform_matches_formula() {
        let line = line(0.0);
        // x = 0, phase = 0: sin(0)·A + cos(0)·A/2
        assert!((base_waveform(&line, 0.0) - (300.0 + 60.0)).abs() < 1e-4);
        let x = 500.0_f32;
        let expected = 300.0 + (x * 0.002).sin() * 120.0 + (x * 0.001).cos() * 60.0;
        assert!((base_waveform(&line, x) - expected).abs() < 1e-3);
    }

    #[test]
    fn disabled_interaction_ignores_pointer() {
        let line = line(1.3);
        let near = FieldSampler::new(None, Vec2::new(100.0, 300.0));
        assert_eq!(near.sample(&line, 100.0), base_waveform(&line, 100.0));
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.5, 0.5)]
    #[case(1.0, 1.0)]
    #[case(0.25, 0.15625)]
    fn smoothstep_values(#[case] t: f32, #[case] expected: f32) {
        assert!((smoothstep(t) - expected).abs() < 1e-6);
    }

    #[test]
    fn proximity_is_continuous_at_the_radius() {
        assert_eq!(proximity(400.0, 400.0), 0.0);
        assert_eq!(proximity(401.0, 400.0), 0.0);
        assert_eq!(proximity(0.0, 400.0), 1.0);
        assert!(proximity(399.999, 400.0) < 1e-6);
    }

    #[test]
    fn pointer_on_point_resolves_to_zero() {
        let point = Vec2::new(100.0, 100.0);
        assert_eq!(deflection(point, point, BEND), 0.0);
    }

    #[test]
    fn pointer_above_pushes_down_by_up_to_radius_times_strength() {
        // Point is 100px below the pointer: angle = π/2, sin = 1.
        let pointer = Vec2::new(100.0, 0.0);
        let point = Vec2::new(100.0, 100.0);
        let expected = smoothstep(300.0 / 400.0) * 400.0 * 0.2;
        assert!((deflection(point, pointer, BEND) - expected).abs() < 1e-4);
        assert!(deflection(Vec2::new(100.0, -100.0), pointer, BEND) < 0.0);
    }

    #[test]
    fn beyond_radius_no_deflection() {
        assert_eq!(
            deflection(Vec2::new(0.0, 500.0), Vec2::ZERO, BEND),
            0.0
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-50.0)]
    fn degenerate_radius_never_deflects(#[case] radius: f32) {
        let bend = Bend {
            radius,
            strength: 1.0,
        };
        assert_eq!(deflection(Vec2::new(3.0, 4.0), Vec2::ZERO, bend), 0.0);
    }

    #[test]
    fn sampler_adds_deflection_to_base() {
        let line = line(0.0);
        let x = 0.0;
        let base = base_waveform(&line, x);
        let pointer = Vec2::new(0.0, base - 50.0);
        let sampler = FieldSampler::new(Some(BEND), pointer);
        let expected = base + deflection(Vec2::new(x, base), pointer, BEND);
        assert_eq!(sampler.sample(&line, x), expected);
        assert!(sampler.sample(&line, x) > base);
    }
}
