//! Seek logging and timing instrumentation.
//!
//! Physical seeks on a GStreamer pipeline can stall for seconds when the
//! decoder has to walk back to a distant keyframe, so every seek is timed
//! from issue to `ASYNC_DONE`.

use std::time::{Duration, Instant};

use crate::coordinator::{DeferReason, DropReason};

/// Log categories for filtering
enum LogCategory {
    Seek,
    Pass,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Seek => "SEEK",
            LogCategory::Pass => "PASS",
        }
    }
}

/// Log the start of a physical seek
pub fn log_seek_start(video_id: usize, target: Duration) -> Instant {
    log::debug!(
        "[{}] Video {} seek START: target={:.3}s",
        LogCategory::Seek.as_str(),
        video_id,
        target.as_secs_f64()
    );
    Instant::now()
}

/// Log the completion of a physical seek with timing
pub fn log_seek_complete(video_id: usize, start: Instant) {
    let elapsed_ms = start.elapsed().as_millis();

    if elapsed_ms > 2000 {
        log::error!(
            "[{}] Video {} seek DEADLOCK SUSPECTED: {}ms",
            LogCategory::Seek.as_str(),
            video_id,
            elapsed_ms
        );
    } else if elapsed_ms > 1000 {
        log::warn!(
            "[{}] Video {} seek SLOW: {}ms",
            LogCategory::Seek.as_str(),
            video_id,
            elapsed_ms
        );
    } else {
        log::debug!(
            "[{}] Video {} seek COMPLETE: {}ms",
            LogCategory::Seek.as_str(),
            video_id,
            elapsed_ms
        );
    }
}

/// Log a seek the pipeline refused
pub fn log_seek_error(video_id: usize, target: Duration, error: &str) {
    log::error!(
        "[{}] Video {} seek to {:.3}s FAILED: {}",
        LogCategory::Seek.as_str(),
        video_id,
        target.as_secs_f64(),
        error
    );
}

/// Log a correction pass that kept its target for a later frame
pub fn log_pass_deferred(reason: DeferReason) {
    // Settling and in-flight deferrals happen every frame during a scrub.
    match reason {
        DeferReason::MetadataNotLoaded => log::debug!(
            "[{}] deferred: metadata not loaded",
            LogCategory::Pass.as_str()
        ),
        DeferReason::SeekInFlight | DeferReason::Settling => {
            log::trace!("[{}] deferred: {:?}", LogCategory::Pass.as_str(), reason)
        }
    }
}

/// Log a correction pass that discarded its target
pub fn log_pass_dropped(reason: DropReason) {
    log::debug!(
        "[{}] dropped pending seek: {:?}",
        LogCategory::Pass.as_str(),
        reason
    );
}

/// Log player session creation
pub fn log_session_opened(video_id: usize, path: &str, coordinated: bool) {
    log::info!(
        "Player session opened: id={}, path={}, coordinated={}",
        video_id,
        path,
        coordinated
    );
}

/// Log player session teardown
pub fn log_session_closed(video_id: usize) {
    log::info!("Player session closed: id={}", video_id);
}
