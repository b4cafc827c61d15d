//! Host abstraction traits so `floatlines-core` stays free of any windowing or pixel backend.

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod color;
mod host;
mod path;

pub use color::{Color, ParseColorError};
pub use host::{FrameQueue, ListenerRegistry};
pub use path::Path;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Displayed size of the element hosting the drawing surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Backing store dimensions matching this displayed size.
    pub fn backing(&self) -> (u32, u32) {
        (to_backing(self.width), to_backing(self.height))
    }
}

fn to_backing(extent: f32) -> u32 {
    if extent.is_finite() && extent > 0.0 {
        extent.round() as u32
    } else {
        0
    }
}

/// How a newly drawn shape combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Additive: overlapping strokes sum their light.
    Lighter,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
}

/// Blurred copy of every stroked shape, painted underneath it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f32,
    pub color: Color,
}

impl Shadow {
    pub const NONE: Shadow = Shadow {
        blur: 0.0,
        color: Color::TRANSPARENT,
    };

    pub fn is_visible(&self) -> bool {
        self.blur > 0.0 && self.color.a > 0
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::NONE
    }
}

/// Immediate-mode 2D drawing target, modelled on a browser canvas context.
///
/// Composite mode and shadow are sticky state applied to every later `stroke`.
pub trait DrawingSurface {
    fn backing_size(&self) -> (u32, u32);
    /// Reallocate the backing store. Contents are discarded.
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn set_composite(&mut self, mode: CompositeMode);
    fn set_shadow(&mut self, shadow: Shadow);
    fn stroke(&mut self, path: &Path, style: &StrokeStyle);
}

/// Identifies one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Source of display-frame callbacks. The host fires each requested token at most once.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Resize,
    PointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Listener registration on the host. Every `listen` must be paired with one `unlisten`.
pub trait HostEvents {
    fn listen(&mut self, kind: EventKind) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
}

/// Events a host forwards to a mounted effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resize(ContainerSize),
    /// `client` is in viewport coordinates; `surface_origin` is the surface's
    /// top-left corner in the same space.
    PointerMove { client: Vec2, surface_origin: Vec2 },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resize(_) => EventKind::Resize,
            HostEvent::PointerMove { .. } => EventKind::PointerMove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_rounds_and_clamps() {
        assert_eq!(ContainerSize::new(799.6, 600.2).backing(), (800, 600));
        assert_eq!(ContainerSize::new(-5.0, f32::NAN).backing(), (0, 0));
    }

    #[test]
    fn composite_mode_uses_canvas_names() {
        #[derive(Deserialize)]
        struct Holder {
            mode: CompositeMode,
        }
        let holder: Holder = serde_json::from_str(r#"{"mode":"source-over"}"#).unwrap();
        assert_eq!(holder.mode, CompositeMode::SourceOver);
        let holder: Holder = serde_json::from_str(r#"{"mode":"lighter"}"#).unwrap();
        assert_eq!(holder.mode, CompositeMode::Lighter);
    }

    #[test]
    fn shadow_visibility_needs_blur_and_alpha() {
        assert!(!Shadow::NONE.is_visible());
        let glow = Shadow {
            blur: 30.0,
            color: Color::rgb(255, 0, 0),
        };
        assert!(glow.is_visible());
        assert!(!Shadow { blur: 0.0, ..glow }.is_visible());
    }
}
