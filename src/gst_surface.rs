//! [`MediaSurface`] over the GStreamer pipeline behind an
//! `iced_video_player::Video`.
//!
//! GStreamer has no "seeking" event, so `Started` is emitted as soon as the
//! pipeline accepts a flushing seek, and `Completed` when the `ASYNC_DONE`
//! carrying that seek's sequence number is popped off the bus by
//! [`GstSurface::pump`]. `ASYNC_DONE` from pause and resume state changes
//! carries a different sequence number and is ignored.

use gstreamer::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::SeekError;
use crate::seek_log;
use crate::surface::{ListenerId, MediaSurface, ReadyState, SeekSignal, SignalHandler, SignalListeners};

/// What one [`GstSurface::pump`] call found on the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Seeks that completed.
    pub completed: usize,
    /// The pipeline reached the end of the stream.
    pub end_of_stream: bool,
}

/// The seek an `ASYNC_DONE` has to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting<T> {
    /// A seek sent by this surface, matched by sequence number.
    Seek(T),
    /// A seek the video player issues on its own; the next `ASYNC_DONE`
    /// completes it.
    External,
}

/// At most one outstanding seek and when it started.
#[derive(Debug)]
struct SeekTracker<T: Copy + PartialEq> {
    pending: Cell<Option<(Awaiting<T>, Instant)>>,
}

impl<T: Copy + PartialEq> SeekTracker<T> {
    fn new() -> Self {
        SeekTracker {
            pending: Cell::new(None),
        }
    }

    /// A newer seek replaces the outstanding one; a flushing seek aborts it.
    fn start(&self, awaiting: Awaiting<T>, at: Instant) {
        self.pending.set(Some((awaiting, at)));
    }

    /// Start time of the seek completed by an `ASYNC_DONE` with `seqnum`.
    fn complete(&self, seqnum: T) -> Option<Instant> {
        match self.pending.get() {
            Some((Awaiting::Seek(expected), start)) if expected == seqnum => {
                self.pending.set(None);
                Some(start)
            }
            Some((Awaiting::External, start)) => {
                self.pending.set(None);
                Some(start)
            }
            _ => None,
        }
    }

    fn clear(&self) {
        self.pending.set(None);
    }
}

/// Shared handle to one video pipeline. Clones refer to the same surface.
#[derive(Clone)]
pub struct GstSurface {
    inner: Rc<Inner>,
}

struct Inner {
    video_id: usize,
    pipeline: gstreamer::Pipeline,
    bus: gstreamer::Bus,
    listeners: SignalListeners,
    seeks: SeekTracker<gstreamer::Seqnum>,
    disposed: Cell<bool>,
}

impl GstSurface {
    pub fn new(video_id: usize, pipeline: gstreamer::Pipeline) -> Result<Self, SeekError> {
        let bus = pipeline.bus().ok_or(SeekError::NoBus)?;
        Ok(GstSurface {
            inner: Rc::new(Inner {
                video_id,
                pipeline,
                bus,
                listeners: SignalListeners::new(),
                seeks: SeekTracker::new(),
                disposed: Cell::new(false),
            }),
        })
    }

    /// Deliver seek completions and end of stream. Call once per frame;
    /// never blocks.
    ///
    /// Only `ASYNC_DONE` and `EOS` are taken off the bus, everything else is
    /// left for the video player. Taking `EOS` here keeps the player from
    /// restarting the stream behind the coordinator's back.
    pub fn pump(&self) -> PumpReport {
        let mut report = PumpReport::default();
        if self.is_disposed() {
            return report;
        }

        while let Some(msg) = self.inner.bus.pop_filtered(&[
            gstreamer::MessageType::AsyncDone,
            gstreamer::MessageType::Eos,
        ]) {
            match msg.view() {
                gstreamer::MessageView::AsyncDone(_) => {
                    let Some(start) = self.inner.seeks.complete(msg.seqnum()) else {
                        log::trace!(
                            "Video {} ASYNC_DONE not matching a pending seek",
                            self.inner.video_id
                        );
                        continue;
                    };
                    seek_log::log_seek_complete(self.inner.video_id, start);
                    self.inner.listeners.emit(SeekSignal::Completed);
                    report.completed += 1;
                }
                gstreamer::MessageView::Eos(_) => {
                    log::debug!("Video {} reached end of stream", self.inner.video_id);
                    report.end_of_stream = true;
                }
                _ => {}
            }
        }
        report
    }

    /// Announce a seek the video player is about to make itself, such as
    /// the restart from zero when an ended video is resumed. It counts as
    /// in flight until the next `ASYNC_DONE`.
    pub fn track_external_seek(&self) {
        if self.is_disposed() {
            return;
        }
        log::debug!("Video {} player-initiated seek", self.inner.video_id);
        self.inner
            .seeks
            .start(Awaiting::External, seek_log::log_seek_start(self.inner.video_id, Duration::ZERO));
        self.inner.listeners.emit(SeekSignal::Started);
    }

    /// Mark the surface as torn down; the pipeline is about to be dropped.
    pub fn mark_disposed(&self) {
        self.inner.disposed.set(true);
        self.inner.seeks.clear();
    }

    pub fn video_id(&self) -> usize {
        self.inner.video_id
    }
}

/// Seek target for `secs`, if it is a time the pipeline can represent.
fn seek_target(secs: f64) -> Option<Duration> {
    let target = Duration::try_from_secs_f64(secs).ok()?;
    // u64::MAX nanoseconds is GStreamer's "no time".
    (target.as_nanos() < u128::from(u64::MAX)).then_some(target)
}

impl MediaSurface for GstSurface {
    fn position(&self) -> f64 {
        self.inner
            .pipeline
            .query_position::<gstreamer::ClockTime>()
            .map_or(0.0, |position| position.nseconds() as f64 / 1_000_000_000.0)
    }

    fn set_position(&self, secs: f64) {
        if self.is_disposed() {
            return;
        }
        let Some(target) = seek_target(secs) else {
            log::warn!(
                "Video {} refusing seek to invalid position {}",
                self.inner.video_id,
                secs
            );
            return;
        };

        let start = seek_log::log_seek_start(self.inner.video_id, target);
        let position = gstreamer::ClockTime::from_nseconds(target.as_nanos() as u64);

        let seek = gstreamer::event::Seek::new(
            1.0,
            gstreamer::SeekFlags::FLUSH | gstreamer::SeekFlags::ACCURATE,
            gstreamer::SeekType::Set,
            Some(position),
            gstreamer::SeekType::None,
            gstreamer::ClockTime::NONE,
        );
        let seqnum = seek.seqnum();

        if self.inner.pipeline.send_event(seek) {
            self.inner.seeks.start(Awaiting::Seek(seqnum), start);
            self.inner.listeners.emit(SeekSignal::Started);
        } else {
            seek_log::log_seek_error(self.inner.video_id, target, "pipeline rejected seek event");
        }
    }

    fn duration(&self) -> f64 {
        self.inner
            .pipeline
            .query_duration::<gstreamer::ClockTime>()
            .map_or(f64::NAN, |duration| duration.nseconds() as f64 / 1_000_000_000.0)
    }

    fn ready_state(&self) -> ReadyState {
        match self.inner.pipeline.current_state() {
            gstreamer::State::Playing => ReadyState::HaveEnoughData,
            gstreamer::State::Paused => ReadyState::HaveCurrentData,
            _ => ReadyState::HaveNothing,
        }
    }

    fn is_disposed(&self) -> bool {
        self.inner.disposed.get() || self.inner.pipeline.current_state() == gstreamer::State::Null
    }

    fn subscribe(&self, signal: SeekSignal, handler: SignalHandler) -> ListenerId {
        self.inner.listeners.add(signal, handler)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner.listeners.remove(id);
    }
}
