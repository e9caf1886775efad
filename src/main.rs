// SPDX-License-Identifier: MPL-2.0
use iced_reel::app::{self, Flags};
use iced_reel::playlist;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iced_reel=info".into()),
        )
        .init();

    let args: Vec<String> = pico_args::Arguments::from_env()
        .finish()
        .into_iter()
        .filter_map(|s| s.into_string().ok())
        .collect();

    // Argument validation happens before any window exists.
    let entries = match playlist::entries_from_args(&args) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: iced_reel \"Name1\" path1 [\"Name2\" path2 ...]");
            return ExitCode::from(2);
        }
    };

    match app::run(Flags { entries }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
