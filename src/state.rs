use chill_player::{GstSurface, SeekConfig, SeekCoordinator};
use iced_video_player::Video;
use std::path::PathBuf;

/// Startup options collected from the command line.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub video: Option<PathBuf>,
    pub start: Option<f64>,
    pub seek_config: SeekConfig,
}

/// One open video and the coordinator that owns its playback position.
pub struct PlayerSession {
    // Declared before `video` so it is dropped while the pipeline still exists.
    pub coordinator: SeekCoordinator<GstSurface>,
    pub surface: GstSurface,
    pub video: Video,
    pub id: usize,
    pub path: PathBuf,
    pub position: f64,
    pub dragging: bool,
    pub looping_enabled: bool,
    /// Stopped at the end without looping; resuming replays from the start.
    pub ended: bool,
    /// The video player handled end of stream itself and will seek to zero
    /// on its own the next time it is un-paused.
    pub restart_on_resume: bool,
    /// Resume-from-history position, requested once the duration is known.
    pub pending_resume: Option<f64>,
}

impl PlayerSession {
    /// Route a UI seek through the coordinator.
    pub fn seek_to(&mut self, secs: f64) {
        self.ended = false;
        self.coordinator.request_seek(secs);
    }
}

/// Application state.
pub struct App {
    pub session: Option<PlayerSession>,
    pub next_id: usize,
    pub seek_config: SeekConfig,
    pub error: Option<String>,
    pub status: String,
}

impl App {
    pub fn new(options: LaunchOptions) -> Self {
        let mut app = App {
            session: None,
            next_id: 0,
            seek_config: options.seek_config,
            error: None,
            status: "Drop a video here to start watching".to_string(),
        };

        if let Some(path) = options.video {
            crate::loader::load_video_from_path(&mut app, path, options.start);
        }
        app
    }
}
