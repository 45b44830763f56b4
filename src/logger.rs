// A tiny logger for the `log` crate that writes to stderr. Filtering is done
// entirely through `log::set_max_level`.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use log::Log;

use crate::style::Theme;

#[derive(Debug)]
pub struct Logger(());

impl Logger {
    /// Installs this logger as the global logger.
    pub fn init() -> Result<(), log::SetLoggerError> {
        static LOGGER: Logger = Logger(());
        log::set_logger(&LOGGER)
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let now = Theme::stderr().highlight(jiff::Timestamp::now());
        let level = record.level();
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                let file = relative(file);
                eprintln!("{now}|{level}|{file}:{line}: {}", record.args());
            }
            (Some(file), None) => {
                let file = relative(file);
                eprintln!("{now}|{level}|{file}: {}", record.args());
            }
            _ => eprintln!("{now}|{level}: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

fn relative(path: &str) -> &str {
    static CWD: LazyLock<Option<PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());
    let Some(ref cwd) = *CWD else { return path };
    Path::new(path)
        .strip_prefix(cwd)
        .ok()
        .and_then(|p| p.to_str())
        .unwrap_or(path)
}
