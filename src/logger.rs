use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Where log lines go.
pub enum LogSink<'a> {
    /// stderr, for headless runs.
    Stderr,
    /// Append to a file, for the interactive UI which owns the terminal.
    File(&'a Path),
}

pub fn init(verbose: bool, sink: LogSink<'_>) {
    let level = if verbose { LevelFilter::Info } else { LevelFilter::Warn };
    match sink {
        LogSink::Stderr => {
            let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
        }
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    let _ = WriteLogger::init(level, Config::default(), file);
                }
                Err(e) => eprintln!("Warning: logging disabled, cannot open {}: {}", path.display(), e),
            }
        }
    }
}
