use iced::Event;

#[derive(Clone, Debug)]
pub enum Message {
    TogglePause,
    ToggleLoop,
    ToggleCoordination,
    Scrub(f64),
    ScrubRelease,
    SkipBy(f64),
    JumpToStart,
    JumpToEnd,
    EndOfStream,
    NewFrame,
    FrameTick,
    ClosePlayer,
    BrowseFile,
    EventOccurred(Event),
}
