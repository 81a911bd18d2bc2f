mod app;
mod frame_driver;
mod loader;
mod message;
mod state;
mod ui;

use chill_player::SeekConfig;
use clap::Parser;
use std::path::PathBuf;

use state::{App, LaunchOptions};

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
    /// Video file to open on launch
    video: Option<PathBuf>,

    /// Resume playback at this position, in seconds
    #[arg(long, value_name = "SECS")]
    start: Option<f64>,

    /// Seek tuning JSON (snapBackwardSeconds, settleMilliseconds, minSnapTimeSeconds, enabled)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write seeks straight to the pipeline without coordination
    #[arg(long)]
    no_coordination: bool,
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut seek_config = match &args.config {
        Some(path) => SeekConfig::load(path).unwrap_or_else(|e| {
            log::warn!("{}; using default seek config", e);
            SeekConfig::default()
        }),
        None => SeekConfig::default(),
    };
    if args.no_coordination {
        seek_config.enabled = false;
    }

    let options = LaunchOptions {
        video: args.video,
        start: args.start,
        seek_config,
    };

    iced::application(move || App::new(options.clone()), App::update, App::view)
        .title("YT and Chill")
        .subscription(App::subscription)
        .run()
}
