//! FloatingLines core: platform-agnostic wave model, field sampling and frame lifecycle.

pub mod config;
pub mod engine;
pub mod model;
pub mod mount;
pub mod pointer;
pub mod sampler;

pub use config::{ConfigError, LinesConfig, Preset};
pub use engine::FloatingLines;
pub use model::WaveLine;
pub use mount::Mount;
pub use pointer::PointerTracker;
pub use sampler::{smoothstep, Bend, FieldSampler};
