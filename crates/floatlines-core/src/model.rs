//! Per-line oscillation parameters, drawn once when the effect mounts.

use std::f32::consts::TAU;
use std::ops::Range;

use floatlines_platform::Color;
use rand::Rng;

use crate::config::LinesConfig;

/// Primary amplitude as a fraction of the container height.
pub const AMPLITUDE_FRACTION: Range<f32> = 0.25..0.45;
/// Spatial angular frequency of the primary sinusoid, radians per pixel.
pub const FREQUENCY_RANGE: Range<f32> = 0.001..0.003;
/// Per-frame phase increment as a multiple of `animation_speed`.
pub const SPEED_FACTOR: Range<f32> = 0.5..1.5;
pub const STROKE_WIDTH_RANGE: Range<f32> = 50.0..100.0;

/// One animated stroke. Only `phase` and `baseline_y` change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveLine {
    baseline_y: f32,
    amplitude: f32,
    frequency: f32,
    phase: f32,
    speed: f32,
    color: Color,
    stroke_width: f32,
}

impl WaveLine {
    pub fn new(
        baseline_y: f32,
        amplitude: f32,
        frequency: f32,
        phase: f32,
        speed: f32,
        color: Color,
        stroke_width: f32,
    ) -> Self {
        Self {
            baseline_y,
            amplitude,
            frequency,
            phase,
            speed,
            color,
            stroke_width,
        }
    }

    pub fn baseline_y(&self) -> f32 {
        self.baseline_y
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub(crate) fn advance(&mut self) {
        self.phase += self.speed;
    }

    pub(crate) fn recenter(&mut self, container_height: f32) {
        self.baseline_y = container_height / 2.0;
    }
}

/// Create `config.line_count` lines scaled to `container_height`.
///
/// Colors cycle through the palette by index; everything else is drawn
/// independently and uniformly. A zero height yields flat lines; an empty
/// palette falls back to white.
pub fn spawn_lines<R: Rng + ?Sized>(
    container_height: f32,
    config: &LinesConfig,
    rng: &mut R,
) -> Vec<WaveLine> {
    let palette = &config.lines_gradient;
    (0..config.line_count)
        .map(|index| WaveLine {
            baseline_y: container_height / 2.0,
            amplitude: rng.random_range(AMPLITUDE_FRACTION) * container_height,
            frequency: rng.random_range(FREQUENCY_RANGE),
            phase: rng.random_range(0.0..TAU),
            speed: rng.random_range(SPEED_FACTOR) * config.animation_speed,
            color: palette
                .get(index % palette.len().max(1))
                .copied()
                .unwrap_or(Color::WHITE),
            stroke_width: rng.random_range(STROKE_WIDTH_RANGE),
        })
        .collect()
}
