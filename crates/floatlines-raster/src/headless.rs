//! Windowless host: mounts FloatingLines on a [`Canvas`] and fires frames in a loop.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use floatlines_core::{LinesConfig, Mount};
use floatlines_platform::{ContainerSize, FrameQueue, HostEvent, ListenerRegistry, Result};
use tracing::{debug, info};

use crate::canvas::Canvas;

pub type CanvasMount = Mount<Canvas, FrameQueue, ListenerRegistry>;

pub struct HeadlessHost {
    mount: CanvasMount,
    frames: FrameQueue,
    listeners: ListenerRegistry,
}

impl HeadlessHost {
    pub fn new(config: LinesConfig, size: ContainerSize) -> Result<Self> {
        let (width, height) = size.backing();
        let frames = FrameQueue::new();
        let listeners = ListenerRegistry::new();
        let mount = Mount::new(
            config,
            size,
            Canvas::new(width, height),
            frames.clone(),
            listeners.clone(),
        )?;
        Ok(Self {
            mount,
            frames,
            listeners,
        })
    }

    pub fn mount(&self) -> &CanvasMount {
        &self.mount
    }

    pub fn canvas(&self) -> &Canvas {
        self.mount.surface()
    }

    /// Deliver `event` if the mount listens for its kind. Returns whether it was delivered.
    pub fn dispatch(&mut self, event: HostEvent) -> bool {
        if !self.listeners.is_listening(event.kind()) {
            debug!("headless: no listener for {:?}", event.kind());
            return false;
        }
        self.mount.handle_event(event);
        true
    }

    /// Fire up to `frames` frames, paced at `fps` when given. Stops early once
    /// nothing is scheduled. Returns the number of frames drawn.
    pub fn run(&mut self, frames: u32, fps: Option<u32>) -> Result<u32> {
        let ticker: Option<Receiver<Instant>> = fps
            .filter(|fps| *fps > 0)
            .map(|fps| crossbeam_channel::tick(Duration::from_secs_f64(1.0 / fps as f64)));
        let started = Instant::now();
        let mut drawn = 0;
        while drawn < frames {
            if let Some(ticker) = &ticker {
                ticker.recv()?;
            }
            let due = self.frames.take_due();
            if due.is_empty() {
                debug!("headless: no frame pending, stopping");
                break;
            }
            for token in due {
                if self.mount.on_frame(token) {
                    drawn += 1;
                }
            }
        }
        info!("headless: drew {} frames in {:?}", drawn, started.elapsed());
        Ok(drawn)
    }

    pub fn unmount(&mut self) {
        self.mount.teardown();
    }
}
