//! Log output module
//!
//! Routes access and error lines to the console or to append-only files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static SINKS: OnceLock<LogSinks> = OnceLock::new();

/// Where one log stream ends up
enum Sink {
    Console { error_stream: bool },
    File(Mutex<File>),
}

impl Sink {
    fn for_path(path: Option<&str>, error_stream: bool) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(append_to(path)?))),
            None => Ok(Self::Console { error_stream }),
        }
    }

    fn write_line(&self, line: &str) {
        match self {
            Self::Console { error_stream: false } => println!("{line}"),
            Self::Console { error_stream: true } => eprintln!("{line}"),
            Self::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{line}");
                }
            }
        }
    }
}

/// The process-wide pair of log streams
struct LogSinks {
    access: Sink,
    error: Sink,
}

/// Open a log file for appending, creating parent directories as needed
fn append_to(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the process-wide sinks; call once at startup
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let sinks = LogSinks {
        access: Sink::for_path(access_log_file, false)?,
        error: Sink::for_path(error_log_file, true)?,
    };
    SINKS.set(sinks).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "logger already initialized")
    })
}

/// Write a line to the access stream (stdout when uninitialized)
pub fn access_line(line: &str) {
    match SINKS.get() {
        Some(sinks) => sinks.access.write_line(line),
        None => println!("{line}"),
    }
}

/// Write a line to the error stream (stderr when uninitialized)
pub fn error_line(line: &str) {
    match SINKS.get() {
        Some(sinks) => sinks.error.write_line(line),
        None => eprintln!("{line}"),
    }
}
