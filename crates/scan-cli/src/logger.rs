use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;

/// Writes log records to stderr so stdout stays clean for command output
pub struct CliLogger {
    max_level: LevelFilter,
}

impl CliLogger {
    /// `verbosity` counts `-v` flags: warnings by default, then info, debug, trace
    pub fn new(verbosity: u8) -> Self {
        let max_level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        Self { max_level }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = if record.level() >= Level::Debug {
            format!(" {}", record.target())
        } else {
            String::new()
        };
        let _ = writeln!(
            std::io::stderr().lock(),
            "{} {:<5}{} {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            target,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
