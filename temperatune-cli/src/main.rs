//! # Temperatune - Command Line Tuner
//!
//! Host application for the temperament core. It plays both roles of a tuner:
//! - **Generator**: prints the pitch of a note or writes it as a WAV tone
//! - **Analyser**: reports the nearest note and cent deviation for a
//!   frequency or for every frame of a WAV recording
//!
//! Logging goes to stderr and is controlled through `RUST_LOG`.

mod cli;
mod recording;
mod tone;

use clap::Parser;
use env_logger::Env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    cli::Options::parse().run()
}
