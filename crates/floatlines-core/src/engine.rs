//! The FloatingLines effect: wave set, pointer state and per-frame drawing.

use floatlines_platform::{ContainerSize, DrawingSurface, LineCap, Path, Shadow, StrokeStyle};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use tracing::{debug, info};

use crate::config::{ConfigError, LinesConfig};
use crate::model::{spawn_lines, WaveLine};
use crate::pointer::PointerTracker;
use crate::sampler::FieldSampler;

pub struct FloatingLines {
    config: LinesConfig,
    lines: Vec<WaveLine>,
    pointer: PointerTracker,
    size: ContainerSize,
    path: Path,
    frames: u64,
}

impl FloatingLines {
    /// Seeds from `config.seed`, or from the thread RNG when unset.
    pub fn new(config: LinesConfig, size: ContainerSize) -> Result<Self, ConfigError> {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        debug!(seed, "seeding wave model");
        Self::with_rng(config, size, &mut rng)
    }

    /// Rejects configs `LinesConfig::validate` refuses, so a frame always samples a bounded path.
    pub fn with_rng<R: Rng + ?Sized>(
        config: LinesConfig,
        size: ContainerSize,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let lines = spawn_lines(size.height, &config, rng);
        info!(
            "FloatingLines mounted: {} lines on {}x{}",
            lines.len(),
            size.width,
            size.height
        );
        let path = Path::with_capacity(sample_steps(size.width, config.sample_stride));
        Ok(Self {
            config,
            lines,
            pointer: PointerTracker::new(),
            size,
            path,
            frames: 0,
        })
    }

    pub fn config(&self) -> &LinesConfig {
        &self.config
    }

    pub fn lines(&self) -> &[WaveLine] {
        &self.lines
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer.position()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Re-centre every baseline on the new height. The line set itself is kept.
    pub fn resize(&mut self, size: ContainerSize) {
        debug!("resize {}x{} -> {}x{}", self.size.width, self.size.height, size.width, size.height);
        self.size = size;
        for line in &mut self.lines {
            line.recenter(size.height);
        }
    }

    pub fn pointer_moved(&mut self, client: Vec2, surface_origin: Vec2) {
        self.pointer.on_pointer_move(client, surface_origin);
    }

    pub fn sampler(&self) -> FieldSampler {
        FieldSampler::new(self.config.bend(), self.pointer.position())
    }

    /// Advance every phase by one step and paint the frame.
    pub fn render_frame<S: DrawingSurface + ?Sized>(&mut self, surface: &mut S) {
        let sampler = self.sampler();
        let stride = self.config.sample_stride;
        let steps = sample_steps(self.size.width, stride);

        surface.clear();
        surface.set_composite(self.config.blend);

        let Self {
            config,
            lines,
            path,
            ..
        } = self;
        for line in lines.iter_mut() {
            line.advance();
            path.move_to(Vec2::new(0.0, sampler.sample(line, 0.0)));
            for step in 1..steps {
                let x = step as f32 * stride;
                path.line_to(Vec2::new(x, sampler.sample(line, x)));
            }
            surface.set_shadow(Shadow {
                blur: config.glow_blur,
                color: line.color(),
            });
            surface.stroke(
                path,
                &StrokeStyle {
                    color: line.color(),
                    width: line.stroke_width(),
                    cap: LineCap::Round,
                },
            );
            surface.set_shadow(Shadow::NONE);
        }
        self.frames += 1;
    }
}

/// Sample count for `x = 0, stride, ..` while `x < width + stride`.
fn sample_steps(width: f32, stride: f32) -> usize {
    ((width.max(0.0) + stride) / stride).ceil().max(1.0) as usize
}
