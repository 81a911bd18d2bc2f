//! Frame clock for the seek coordinator.
//!
//! The coordinator only issues seeks from a frame tick, and seek completions
//! are only noticed when the bus is pumped, so both run off this ~60Hz
//! subscription while a player session is open.

use iced::Subscription;
use std::time::Duration;

use crate::message::Message;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Create a subscription that ticks once per display frame
pub fn frame_subscription() -> Subscription<Message> {
    iced::time::every(FRAME_INTERVAL).map(|_| Message::FrameTick)
}
