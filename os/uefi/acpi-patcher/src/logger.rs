use debugcon::debugcon_trace;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct UefiLogger {
    max_level: LevelFilter,
}

impl UefiLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Install `logger` as the global logger. Call this once during early init.
    ///
    /// # Errors
    /// Fails if a logger was already installed.
    pub fn init(logger: &'static Self) -> Result<(), SetLoggerError> {
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(())
    }
}

impl Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "[LEVEL] target: message"
        debugcon_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        uefi::println!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
