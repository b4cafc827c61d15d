//! Owns one mounted FloatingLines instance and everything it registered with the host.
//!
//! Every frame request and listener created here is released by `teardown`,
//! which also runs on drop. Frame callbacks carry a token; only the token
//! currently pending on a live mount renders, so a stale callback that fires
//! after teardown never touches the surface.

use floatlines_platform::{
    ContainerSize, DrawingSurface, EventKind, FrameScheduler, FrameToken, HostEvent, HostEvents,
    ListenerId,
};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, LinesConfig};
use crate::engine::FloatingLines;

pub struct Mount<S, F, E>
where
    S: DrawingSurface,
    F: FrameScheduler,
    E: HostEvents,
{
    engine: FloatingLines,
    surface: S,
    scheduler: F,
    events: E,
    listeners: Vec<ListenerId>,
    pending: Option<FrameToken>,
    live: bool,
}

impl<S, F, E> Mount<S, F, E>
where
    S: DrawingSurface,
    F: FrameScheduler,
    E: HostEvents,
{
    /// Fails before touching the host when `config` does not validate.
    pub fn new(
        config: LinesConfig,
        size: ContainerSize,
        surface: S,
        scheduler: F,
        events: E,
    ) -> Result<Self, ConfigError> {
        let engine = FloatingLines::new(config, size)?;
        Ok(Self::with_engine(engine, surface, scheduler, events))
    }

    /// Size the surface to the engine, bind listeners and request the first frame.
    pub fn with_engine(engine: FloatingLines, mut surface: S, mut scheduler: F, mut events: E) -> Self {
        let (width, height) = engine.size().backing();
        surface.resize(width, height);

        let mut listeners = vec![events.listen(EventKind::Resize)];
        if engine.config().interactive {
            listeners.push(events.listen(EventKind::PointerMove));
        }
        let pending = Some(scheduler.request_frame());
        info!("mount: {} listeners bound, first frame requested", listeners.len());

        Self {
            engine,
            surface,
            scheduler,
            events,
            listeners,
            pending,
            live: true,
        }
    }

    pub fn engine(&self) -> &FloatingLines {
        &self.engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        if !self.live {
            debug!("mount: dropping {:?} after teardown", event.kind());
            return;
        }
        match event {
            HostEvent::Resize(size) => self.resize(size),
            HostEvent::PointerMove {
                client,
                surface_origin,
            } => {
                if self.engine.config().interactive {
                    self.engine.pointer_moved(client, surface_origin);
                }
            }
        }
    }

    fn resize(&mut self, size: ContainerSize) {
        let (width, height) = size.backing();
        self.surface.resize(width, height);
        self.engine.resize(size);
    }

    /// Host callback for a fired frame. Returns whether a frame was drawn.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        if !self.live || self.pending != Some(token) {
            warn!("mount: ignoring stale frame {:?}", token);
            return false;
        }
        self.engine.render_frame(&mut self.surface);
        self.pending = Some(self.scheduler.request_frame());
        true
    }

    /// Cancel the pending frame and remove every listener. Safe to call twice.
    pub fn teardown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
        for id in self.listeners.drain(..) {
            self.events.unlisten(id);
        }
        info!("mount: torn down after {} frames", self.engine.frames());
    }
}

impl<S, F, E> Drop for Mount<S, F, E>
where
    S: DrawingSurface,
    F: FrameScheduler,
    E: HostEvents,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
