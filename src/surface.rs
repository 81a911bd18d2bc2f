//! Capability contract for the media-playback surface a coordinator manages.
//!
//! Surfaces are shared handles (the player owns the same surface the
//! coordinator holds), so every method takes `&self`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// How much of the media the surface has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Duration and seekable range are known.
    pub fn has_metadata(self) -> bool {
        self >= ReadyState::HaveMetadata
    }
}

/// Seek lifecycle signals emitted by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekSignal {
    Started,
    Completed,
}

/// Handle for removing a registered signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type SignalHandler = Box<dyn FnMut()>;

/// A media-playback surface: position, duration, readiness and seek signals.
///
/// `set_position` is the raw write. While a [`crate::SeekCoordinator`] is
/// attached, only the coordinator may call it; every other seek must go
/// through [`crate::SeekCoordinator::request_seek`].
pub trait MediaSurface {
    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Start a physical seek to `secs`.
    fn set_position(&self, secs: f64);

    /// Media duration in seconds, NaN while unknown.
    fn duration(&self) -> f64;

    fn ready_state(&self) -> ReadyState;

    /// True once the surface has been torn down.
    fn is_disposed(&self) -> bool;

    fn subscribe(&self, signal: SeekSignal, handler: SignalHandler) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}

type SharedHandler = Rc<RefCell<SignalHandler>>;

/// Listener registry for [`MediaSurface`] implementations.
#[derive(Default)]
pub struct SignalListeners {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(ListenerId, SeekSignal, SharedHandler)>>,
}

impl SignalListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, signal: SeekSignal, handler: SignalHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .push((id, signal, Rc::new(RefCell::new(handler))));
        id
    }

    /// Remove a handler. Unknown ids are ignored.
    pub fn remove(&self, id: ListenerId) {
        self.handlers.borrow_mut().retain(|(other, _, _)| *other != id);
    }

    /// Invoke every handler registered for `signal`, in registration order.
    ///
    /// The handler list is snapshotted first, so handlers may register or
    /// remove listeners while running.
    pub fn emit(&self, signal: SeekSignal) {
        let matching: Vec<SharedHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, s, _)| *s == signal)
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in matching {
            // A handler that re-emits the same signal would recurse into itself.
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)();
            } else {
                log::warn!("Skipping re-entrant {:?} handler", signal);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}
