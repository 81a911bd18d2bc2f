//! Frame-driven seek coordination.
//!
//! Every seek the player wants goes through [`SeekCoordinator::request_seek`].
//! Requests only record the latest target; the physical seek is issued from
//! [`SeekCoordinator::on_frame`], which the embedder calls once per rendered
//! frame while [`SeekCoordinator::needs_frame`] is true. Each pass either
//! issues exactly one seek, defers to the next frame, or drops the target:
//!
//! - metadata not loaded yet: defer
//! - duration unknown: drop
//! - previous seek still in flight: defer
//! - within `settle_milliseconds` of the last completed seek: defer
//!
//! The issued position is clamped to `[0, duration]` and snapped backward by
//! `snap_backward_seconds` so sparse-keyframe downloads land on or before a
//! keyframe instead of stalling on a decode.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::clock::{Clock, SystemClock};
use crate::config::SeekConfig;
use crate::error::SeekError;
use crate::seek_log;
use crate::surface::{ListenerId, MediaSurface, SeekSignal};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPhase {
    /// No pending target and no seek in flight.
    Idle,
    /// A target is waiting for the next correction pass.
    Pending,
    /// A physical seek was issued and has not completed yet.
    Seeking,
    /// The last seek completed less than `settle_milliseconds` ago.
    Settling,
    Disposed,
}

/// Why a correction pass kept its target for a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    MetadataNotLoaded,
    SeekInFlight,
    Settling,
}

/// Why a correction pass discarded its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    SurfaceGone,
    UnknownDuration,
}

/// Result of one [`SeekCoordinator::on_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassOutcome {
    /// Nothing was scheduled or no target was pending.
    Idle,
    Deferred(DeferReason),
    Dropped(DropReason),
    /// A physical seek to `target` was issued for the `requested` position.
    Issued { requested: f64, target: f64 },
}

/// Shared with the signal handlers. Plain cells, so a signal delivered in the
/// middle of a correction pass is always recorded.
#[derive(Debug, Default)]
struct SeekState {
    seek_target: Cell<Option<f64>>,
    tick_scheduled: Cell<bool>,
    is_seeking: Cell<bool>,
    last_seek_completed_at: Cell<Option<u64>>,
}

/// Single writer of the playback position of one player session.
///
/// The seek lifecycle listeners stay attached from construction until
/// [`dispose`](Self::dispose), so a seek written while coordination is
/// disabled still counts as in flight once it is enabled again.
pub struct SeekCoordinator<S: MediaSurface, C: Clock + 'static = SystemClock> {
    surface: Option<S>,
    clock: Rc<C>,
    config: SeekConfig,
    state: Rc<SeekState>,
    enabled: bool,
    listeners: Vec<ListenerId>,
}

impl<S: MediaSurface> SeekCoordinator<S, SystemClock> {
    pub fn new(surface: S, config: SeekConfig) -> Self {
        Self::with_clock(surface, SystemClock::new(), config)
    }
}

impl<S: MediaSurface, C: Clock + 'static> SeekCoordinator<S, C> {
    pub fn with_clock(surface: S, clock: C, config: SeekConfig) -> Self {
        let clock = Rc::new(clock);
        let state = Rc::new(SeekState::default());

        let started = Rc::downgrade(&state);
        let started_id = surface.subscribe(
            SeekSignal::Started,
            Box::new(move || {
                with_state(&started, |state| state.is_seeking.set(true));
            }),
        );

        let completed = Rc::downgrade(&state);
        let completion_clock = Rc::clone(&clock);
        let completed_id = surface.subscribe(
            SeekSignal::Completed,
            Box::new(move || {
                with_state(&completed, |state| {
                    state.is_seeking.set(false);
                    state
                        .last_seek_completed_at
                        .set(Some(completion_clock.now_ms()));
                });
            }),
        );

        log::debug!(
            "Seek coordinator attached (coordination {})",
            if config.enabled { "on" } else { "off" }
        );

        SeekCoordinator {
            surface: Some(surface),
            clock,
            config,
            state,
            enabled: config.enabled,
            listeners: vec![started_id, completed_id],
        }
    }

    /// Attach to a surface that may not exist yet.
    ///
    /// A missing surface is an integration bug, so this is the only
    /// constructor that fails.
    pub fn attach(surface: Option<S>, clock: C, config: SeekConfig) -> Result<Self, SeekError> {
        let surface = surface.ok_or(SeekError::MissingSurface)?;
        Ok(Self::with_clock(surface, clock, config))
    }

    /// Ask for playback to move to `target_secs`.
    ///
    /// Never blocks and never fails. Calls made before the next correction
    /// pass collapse into the last one. Non-finite targets, and any request
    /// while the duration is unknown, are dropped.
    pub fn request_seek(&mut self, target_secs: f64) {
        let Some(surface) = self.live_surface() else {
            return;
        };

        if !self.enabled {
            surface.set_position(target_secs);
            return;
        }

        if !target_secs.is_finite() || known_duration(surface.duration()).is_none() {
            log::debug!(
                "Dropping seek request to {} (duration={})",
                target_secs,
                surface.duration()
            );
            return;
        }

        self.state.seek_target.set(Some(target_secs));
        self.state.tick_scheduled.set(true);
        log::trace!("Seek requested: {}s", target_secs);
    }

    /// Live playback position, read straight from the surface.
    pub fn current_position(&self) -> f64 {
        self.live_surface().map_or(0.0, |surface| surface.position())
    }

    /// Whether a correction pass is waiting for the next frame.
    pub fn needs_frame(&self) -> bool {
        self.enabled && self.state.tick_scheduled.get()
    }

    /// Run the scheduled correction pass, if any.
    pub fn on_frame(&mut self) -> PassOutcome {
        if !self.enabled {
            return PassOutcome::Idle;
        }

        let state = &self.state;
        if !state.tick_scheduled.replace(false) {
            return PassOutcome::Idle;
        }

        let Some(requested) = state.seek_target.get() else {
            return PassOutcome::Idle;
        };

        let Some(surface) = self.surface.as_ref().filter(|s| !s.is_disposed()) else {
            state.seek_target.set(None);
            return dropped(DropReason::SurfaceGone);
        };

        if !surface.ready_state().has_metadata() {
            state.tick_scheduled.set(true);
            return deferred(DeferReason::MetadataNotLoaded);
        }

        let Some(duration) = known_duration(surface.duration()) else {
            state.seek_target.set(None);
            return dropped(DropReason::UnknownDuration);
        };

        // Lifecycle flags are read after every surface query, since a query
        // may deliver a pending Completed.
        if state.is_seeking.get() {
            state.tick_scheduled.set(true);
            return deferred(DeferReason::SeekInFlight);
        }

        if let Some(completed_at) = state.last_seek_completed_at.get() {
            let elapsed = self.clock.now_ms().saturating_sub(completed_at);
            if elapsed < self.config.settle_milliseconds {
                state.tick_scheduled.set(true);
                return deferred(DeferReason::Settling);
            }
        }

        let target = self.config.correct(requested, duration);

        // Cleared before the write so a request made from inside the surface
        // call starts a fresh cycle.
        state.seek_target.set(None);

        log::info!(
            "Issuing seek: requested={:.3}s target={:.3}s duration={:.3}s",
            requested,
            target,
            duration
        );
        surface.set_position(target);

        PassOutcome::Issued { requested, target }
    }

    pub fn phase(&self) -> SeekPhase {
        if self.surface.is_none() {
            return SeekPhase::Disposed;
        }

        let state = &self.state;
        if state.is_seeking.get() {
            return SeekPhase::Seeking;
        }
        if state.seek_target.get().is_some() {
            return SeekPhase::Pending;
        }
        match state.last_seek_completed_at.get() {
            Some(completed_at)
                if self.clock.now_ms().saturating_sub(completed_at)
                    < self.config.settle_milliseconds =>
            {
                SeekPhase::Settling
            }
            _ => SeekPhase::Idle,
        }
    }

    /// The target the next correction pass will apply.
    pub fn pending_target(&self) -> Option<f64> {
        self.state.seek_target.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &SeekConfig {
        &self.config
    }

    /// Resume coordinating seeks. No-op when already enabled or disposed.
    ///
    /// In-flight and settle tracking carry over, so a seek written while
    /// disabled still gates the next coordinated one.
    pub fn enable(&mut self) {
        if self.enabled || self.live_surface().is_none() {
            return;
        }
        self.enabled = true;
        log::debug!("Seek coordination enabled");
    }

    /// Stop coordinating. A pending target is discarded without being issued
    /// and later requests are written to the surface directly.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.state.tick_scheduled.set(false);
        if let Some(discarded) = self.state.seek_target.take() {
            log::debug!("Discarding pending seek to {}s", discarded);
        }
        log::debug!("Seek coordination disabled");
    }

    /// Tear down for good. Safe to call repeatedly and after the surface
    /// itself is gone.
    pub fn dispose(&mut self) {
        if self.surface.is_none() {
            return;
        }
        self.detach_listeners();
        self.enabled = false;
        self.state.seek_target.set(None);
        self.state.tick_scheduled.set(false);
        self.state.is_seeking.set(false);
        self.state.last_seek_completed_at.set(None);
        self.surface = None;
        log::debug!("Seek coordinator disposed");
    }

    fn live_surface(&self) -> Option<&S> {
        self.surface.as_ref().filter(|surface| !surface.is_disposed())
    }

    fn detach_listeners(&mut self) {
        let ids = std::mem::take(&mut self.listeners);
        if let Some(surface) = self.live_surface() {
            for id in ids {
                surface.unsubscribe(id);
            }
        }
    }
}

impl<S: MediaSurface, C: Clock + 'static> Drop for SeekCoordinator<S, C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A duration the target can be clamped to.
fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration >= 0.0).then_some(duration)
}

fn with_state(state: &Weak<SeekState>, update: impl FnOnce(&SeekState)) {
    if let Some(state) = state.upgrade() {
        update(&state);
    }
}

fn deferred(reason: DeferReason) -> PassOutcome {
    seek_log::log_pass_deferred(reason);
    PassOutcome::Deferred(reason)
}

fn dropped(reason: DropReason) -> PassOutcome {
    seek_log::log_pass_dropped(reason);
    PassOutcome::Dropped(reason)
}
