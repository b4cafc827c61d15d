//! Single-threaded scheduler and listener bookkeeping shared between a host and a mounted effect.
//!
//! Both types are cheap `Rc` handles: the mount owns one clone through the
//! `FrameScheduler`/`HostEvents` traits, the host keeps another to drive it.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::{EventKind, FrameScheduler, FrameToken, HostEvents, ListenerId};

#[derive(Default)]
struct QueueState {
    next_token: u64,
    pending: VecDeque<FrameToken>,
    requested: u64,
    cancelled: u64,
}

/// Frame requests waiting for the host's next display refresh.
#[derive(Clone, Default)]
pub struct FrameQueue {
    state: Rc<RefCell<QueueState>>,
    waker: Option<Rc<dyn Fn()>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `waker` runs on every request, e.g. to ask a UI toolkit for a repaint.
    pub fn with_waker(waker: impl Fn() + 'static) -> Self {
        Self {
            state: Rc::default(),
            waker: Some(Rc::new(waker)),
        }
    }

    /// Drain the tokens due this refresh, oldest first.
    pub fn take_due(&self) -> Vec<FrameToken> {
        self.state.borrow_mut().pending.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn requested_total(&self) -> u64 {
        self.state.borrow().requested
    }

    pub fn cancelled_total(&self) -> u64 {
        self.state.borrow().cancelled
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        let token = {
            let mut state = self.state.borrow_mut();
            state.next_token += 1;
            state.requested += 1;
            let token = FrameToken(state.next_token);
            state.pending.push_back(token);
            token
        };
        if let Some(waker) = &self.waker {
            waker();
        }
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|pending| *pending != token);
        if state.pending.len() < before {
            state.cancelled += 1;
            debug!("frame {:?} cancelled", token);
        }
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FrameQueue")
            .field("pending", &state.pending)
            .field("requested", &state.requested)
            .field("cancelled", &state.cancelled)
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    active: HashMap<ListenerId, EventKind>,
}

/// Tracks which event kinds have live listeners so the host only forwards those.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.state.borrow().active.values().any(|k| *k == kind)
    }

    pub fn active(&self) -> usize {
        self.state.borrow().active.len()
    }
}

impl HostEvents for ListenerRegistry {
    fn listen(&mut self, kind: EventKind) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state.active.insert(id, kind);
        debug!("listener {:?} bound for {:?}", id, kind);
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        match self.state.borrow_mut().active.remove(&id) {
            Some(kind) => debug!("listener {:?} for {:?} removed", id, kind),
            None => warn!("unlisten for unknown listener {:?}", id),
        }
    }
}
