use chill_player::{GstSurface, SeekCoordinator, SeekError, seek_log};
use iced_video_player::Video;
use std::path::{Path, PathBuf};

use crate::state::{App, PlayerSession};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Video file not found: {0}")]
    NotFound(#[from] std::io::Error),

    #[error("Invalid video path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Failed to load video: {0}")]
    Video(#[from] iced_video_player::Error),

    #[error("Failed to attach seek coordinator: {0}")]
    Surface(#[from] SeekError),
}

/// Load a video from a file path, replacing the current session.
pub fn load_video_from_path(app: &mut App, video_path: PathBuf, resume_at: Option<f64>) {
    app.status = "Loading video...".to_string();
    close_session(app);

    match open_session(app, &video_path, resume_at) {
        Ok(session) => {
            seek_log::log_session_opened(
                session.id,
                &session.path.display().to_string(),
                session.coordinator.is_enabled(),
            );
            app.next_id += 1;
            app.error = None;
            app.status = format!(
                "Playing: {}",
                video_path.file_name().unwrap_or_default().to_string_lossy()
            );
            app.session = Some(session);
        }
        Err(e) => {
            log::error!("{}", e);
            app.error = Some(e.to_string());
        }
    }
}

fn open_session(
    app: &App,
    video_path: &Path,
    resume_at: Option<f64>,
) -> Result<PlayerSession, LoadError> {
    std::fs::metadata(video_path)?;
    let url = url::Url::from_file_path(video_path)
        .map_err(|_| LoadError::InvalidPath(video_path.to_path_buf()))?;

    let mut video = Video::new(&url)?;
    // End of stream is handled by the app so restarts go through the coordinator.
    video.set_looping(false);

    let id = app.next_id;
    let surface = GstSurface::new(id, video.pipeline())?;
    let coordinator = SeekCoordinator::new(surface.clone(), app.seek_config);

    Ok(PlayerSession {
        coordinator,
        surface,
        video,
        id,
        path: video_path.to_path_buf(),
        position: 0.0,
        dragging: false,
        looping_enabled: true,
        ended: false,
        restart_on_resume: false,
        pending_resume: resume_at.filter(|secs| secs.is_finite() && *secs > 0.0),
    })
}

/// Dispose the current session, detaching the coordinator before the
/// pipeline goes away.
pub fn close_session(app: &mut App) {
    if let Some(mut session) = app.session.take() {
        session.coordinator.dispose();
        session.surface.mark_disposed();
        seek_log::log_session_closed(session.id);
    }
}
