use chill_player::{MediaSurface, SeekPhase};
use iced::widget::{button, center, column, container, row, slider, stack, text};
use iced::{Color, Element, Length, Theme, alignment};
use iced_video_player::VideoPlayer;

use crate::message::Message;
use crate::state::{App, PlayerSession};

/// Get the safe duration of a video, handling invalid values.
pub fn safe_duration(session: &PlayerSession) -> f64 {
    let duration = session.surface.duration();
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        1.0 // Keeps the slider range non-empty until the duration is known
    }
}

/// Format a position as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Short label for the coordinator state shown in the controls bar.
pub fn phase_label(phase: SeekPhase, enabled: bool) -> &'static str {
    if !enabled {
        return "seek: direct";
    }
    match phase {
        SeekPhase::Idle => "seek: idle",
        SeekPhase::Pending => "seek: pending",
        SeekPhase::Seeking => "seek: seeking",
        SeekPhase::Settling => "seek: settling",
        SeekPhase::Disposed => "seek: closed",
    }
}

/// Render the main view.
pub fn render_main_view(app: &App) -> Element<'_, Message> {
    if let Some(error) = &app.error {
        return center(column![
            text("Error Loading Video").size(32),
            text(error.clone()),
            button(text("[Browse Files]").size(18))
                .padding(10)
                .on_press(Message::BrowseFile),
            text(app.status.clone()).size(12),
        ]
        .spacing(20))
        .width(Length::Fill)
        .height(Length::Fill)
        .into();
    }

    let Some(session) = &app.session else {
        return center(
            column![
                text("Drag & Drop a Video Here").size(48),
                text("or click browse to pick a download from your library").size(16),
                button(text("[Browse Files]").size(18))
                    .padding(10)
                    .on_press(Message::BrowseFile),
                text(app.status.clone()).size(12),
            ]
            .spacing(20),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into();
    };

    render_player(app, session)
}

/// Render the video with its controls overlay.
fn render_player<'a>(app: &'a App, session: &'a PlayerSession) -> Element<'a, Message> {
    let video_player = container(
        VideoPlayer::new(&session.video)
            .on_end_of_stream(Message::EndOfStream)
            .on_new_frame(Message::NewFrame),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill);

    let overlay = column![
        row![
            text(app.status.clone()).size(14).color(Color::WHITE),
            container("").width(Length::Fill),
            button(text("X").size(20))
                .on_press(Message::ClosePlayer)
                .padding(5)
        ]
        .padding(10),
        container("").height(Length::Fill),
        render_controls_bar(session),
    ];

    stack![video_player, overlay].into()
}

/// Build the bottom controls: scrub bar, buttons and timestamps.
fn render_controls_bar(session: &PlayerSession) -> Element<'_, Message> {
    let duration = safe_duration(session);
    let coordinated = session.coordinator.is_enabled();

    container(
        column![
            slider(0.0..=duration, session.position.min(duration), Message::Scrub)
                .step(0.1)
                .on_release(Message::ScrubRelease),
            row![
                button(text(if session.video.paused() { ">" } else { "||" }).size(12))
                    .on_press(Message::TogglePause)
                    .padding(8),
                button(text(if session.looping_enabled { "↻" } else { "→" }).size(12))
                    .on_press(Message::ToggleLoop)
                    .padding(8),
                button(text(if coordinated { "Sync" } else { "Raw" }).size(12))
                    .on_press(Message::ToggleCoordination)
                    .padding(8),
                text(format!(
                    "{} / {}",
                    format_timestamp(session.position),
                    format_timestamp(session.surface.duration())
                ))
                .size(12),
                container("").width(Length::Fill),
                text(phase_label(session.coordinator.phase(), coordinated)).size(12),
            ]
            .spacing(5)
            .align_y(alignment::Vertical::Center),
        ]
        .spacing(5)
        .padding(10),
    )
    .style(|_theme: &Theme| container::Style {
        background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.7).into()),
        ..Default::default()
    })
    .width(Length::Fill)
    .into()
}
