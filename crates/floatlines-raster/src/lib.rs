//! Software rendering backend for FloatingLines: a CPU canvas and a headless frame host.

mod canvas;
pub mod headless;

pub use canvas::{blend, Canvas};
pub use headless::HeadlessHost;
