use chill_player::{MediaSurface, PassOutcome};
use iced::event;
use iced::keyboard::key::Named;
use iced::{Element, Subscription};

use crate::frame_driver;
use crate::loader;
use crate::message::Message;
use crate::state::{App, PlayerSession};
use crate::ui;

/// Keyboard skip distance in seconds.
const SKIP_SECONDS: f64 = 5.0;

impl App {
    /// Handle UI messages and state updates.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::BrowseFile => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter(
                        "Videos",
                        &["mp4", "MP4", "m4v", "M4V", "mkv", "MKV", "webm", "WEBM", "mov", "MOV"],
                    )
                    .pick_file()
                {
                    loader::load_video_from_path(self, path, None);
                }
            }
            Message::EventOccurred(event) => match event {
                iced::Event::Window(iced::window::Event::FileDropped(path)) => {
                    loader::load_video_from_path(self, path, None);
                }
                iced::Event::Keyboard(iced::keyboard::Event::KeyPressed {
                    key: iced::keyboard::Key::Named(key),
                    ..
                }) => match key {
                    Named::ArrowRight => self.update(Message::SkipBy(SKIP_SECONDS)),
                    Named::ArrowLeft => self.update(Message::SkipBy(-SKIP_SECONDS)),
                    Named::Home => self.update(Message::JumpToStart),
                    Named::End => self.update(Message::JumpToEnd),
                    Named::Space => self.update(Message::TogglePause),
                    _ => {}
                },
                _ => {}
            },
            Message::ClosePlayer => {
                loader::close_session(self);
                self.status = "Drop a video here to start watching".to_string();
            }
            Message::TogglePause => {
                if let Some(session) = self.session.as_mut() {
                    if session.video.paused() {
                        resume_playback(session);
                    } else {
                        session.video.set_paused(true);
                    }
                }
            }
            Message::ToggleLoop => {
                if let Some(session) = self.session.as_mut() {
                    session.looping_enabled = !session.looping_enabled;
                }
            }
            Message::ToggleCoordination => {
                if let Some(session) = self.session.as_mut() {
                    if session.coordinator.is_enabled() {
                        session.coordinator.disable();
                        self.status = "Seek coordination off".to_string();
                    } else {
                        session.coordinator.enable();
                        self.status = "Seek coordination on".to_string();
                    }
                }
            }
            Message::Scrub(secs) => {
                if let Some(session) = self.session.as_mut() {
                    if !session.dragging {
                        session.video.set_paused(true);
                    }
                    session.dragging = true;
                    session.position = secs;
                    session.seek_to(secs);
                }
            }
            Message::ScrubRelease => {
                if let Some(session) = self.session.as_mut() {
                    session.dragging = false;
                    session.seek_to(session.position);
                    resume_playback(session);
                }
            }
            Message::SkipBy(delta) => {
                if let Some(session) = self.session.as_mut() {
                    let target = session.coordinator.current_position() + delta;
                    session.seek_to(target);
                }
            }
            Message::JumpToStart => {
                if let Some(session) = self.session.as_mut() {
                    session.seek_to(0.0);
                }
            }
            Message::JumpToEnd => {
                if let Some(session) = self.session.as_mut() {
                    let duration = session.surface.duration();
                    session.seek_to(duration);
                }
            }
            Message::EndOfStream => {
                // The video player saw end of stream before our bus pump did.
                if let Some(session) = self.session.as_mut() {
                    session.restart_on_resume = true;
                    handle_end_of_stream(session);
                }
            }
            Message::NewFrame => {
                if let Some(session) = self.session.as_mut() {
                    if !session.dragging {
                        let pos = session.coordinator.current_position();
                        if pos.is_finite() && pos >= 0.0 {
                            session.position = pos;
                        }
                    }
                }
            }
            Message::FrameTick => {
                if let Some(session) = self.session.as_mut() {
                    if session.surface.pump().end_of_stream {
                        handle_end_of_stream(session);
                    }

                    if let Some(resume_at) = session.pending_resume {
                        if session.surface.duration().is_finite() {
                            log::info!("Resuming video {} at {}s", session.id, resume_at);
                            session.seek_to(resume_at);
                            session.pending_resume = None;
                        }
                    }

                    if session.coordinator.needs_frame() {
                        if let PassOutcome::Issued { target, .. } = session.coordinator.on_frame() {
                            if !session.dragging {
                                session.position = target;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Subscribe to events.
    pub fn subscription(&self) -> Subscription<Message> {
        let events = event::listen().map(Message::EventOccurred);
        if self.session.is_some() {
            Subscription::batch([events, frame_driver::frame_subscription()])
        } else {
            events
        }
    }

    /// Render the view.
    pub fn view(&self) -> Element<'_, Message> {
        ui::render_main_view(self)
    }
}

/// Un-pause playback without a second writer of the position.
fn resume_playback(session: &mut PlayerSession) {
    if session.restart_on_resume {
        session.surface.track_external_seek();
        session.restart_on_resume = false;
    } else if session.ended {
        session.coordinator.request_seek(0.0);
    }
    session.ended = false;
    session.video.set_paused(false);
}

fn handle_end_of_stream(session: &mut PlayerSession) {
    if !session.looping_enabled {
        session.ended = true;
        session.video.set_paused(true);
        return;
    }

    session.position = 0.0;
    if session.restart_on_resume {
        resume_playback(session);
    } else {
        session.coordinator.request_seek(0.0);
    }
}
