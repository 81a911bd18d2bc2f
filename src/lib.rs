//! Seek coordination for the YT and Chill in-app player.
//!
//! [`SeekCoordinator`] is the only writer of a player's playback position:
//! callers request seeks, and once per frame the coordinator issues at most
//! one physical seek to the [`MediaSurface`], clamped and snapped backward
//! toward a keyframe.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gst_surface;
pub mod seek_log;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SeekConfig;
pub use coordinator::{DeferReason, DropReason, PassOutcome, SeekCoordinator, SeekPhase};
pub use error::SeekError;
pub use gst_surface::{GstSurface, PumpReport};
pub use surface::{ListenerId, MediaSurface, ReadyState, SeekSignal, SignalHandler, SignalListeners};
