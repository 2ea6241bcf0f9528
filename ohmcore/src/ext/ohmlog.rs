use enum_map::{Enum, EnumMap};
use strum::{Display, FromRepr};

/// Severity of a solver log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, Display, Enum)]
#[repr(u32)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// One record emitted while solving.
///
/// Records carry no timestamp or thread name: two solves of the same graph must
/// produce identical record streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub module: &'static str,
    pub line: u32,
}

impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.module, self.message)
    }
}

/// Ordered sink collecting every record of one solve.
///
/// Each record is forwarded to the [`log`] facade as it arrives, so an installed
/// logger sees the same stream.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<LogRecord>,
    counts: EnumMap<LogLevel, usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: LogRecord) {
        log::log!(target: record.module, log::Level::from(record.level), "{}", record.message);
        self.counts[record.level] += 1;
        self.records.push(record);
    }

    #[inline]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records at exactly `level`.
    #[inline]
    pub fn count(&self, level: LogLevel) -> usize {
        self.counts[level]
    }

    pub fn at_level(&self, level: LogLevel) -> impl Iterator<Item = &LogRecord> {
        self.records.iter().filter(move |r| r.level == level)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogRecord> {
        self.at_level(LogLevel::Warn)
    }
}

#[macro_export]
macro_rules! ohmlog {
    (
        $sink:expr,
        $level:expr,
        $( $arg:tt )*
    ) => {
        {
            let record = $crate::ext::ohmlog::LogRecord {
                level: $level,
                message: format!($($arg)*),
                module: module_path!(),
                line: line!(),
            };
            $sink.record(record);
        }
    };
}

#[macro_export]
macro_rules! ohmtrace {
    (
        $sink:expr,
        $( $arg:tt )*
    ) => {
        $crate::ohmlog!(
            $sink,
            $crate::ext::ohmlog::LogLevel::Trace,
            $( $arg )*
        );
    };
}

#[macro_export]
macro_rules! ohmdebug {
    (
        $sink:expr,
        $( $arg:tt )*
    ) => {
        $crate::ohmlog!(
            $sink,
            $crate::ext::ohmlog::LogLevel::Debug,
            $( $arg )*
        );
    };
}

#[macro_export]
macro_rules! ohminfo {
    (
        $sink:expr,
        $( $arg:tt )*
    ) => {
        $crate::ohmlog!(
            $sink,
            $crate::ext::ohmlog::LogLevel::Info,
            $( $arg )*
        );
    };
}

#[macro_export]
macro_rules! ohmwarn {
    (
        $sink:expr,
        $( $arg:tt )*
    ) => {
        $crate::ohmlog!(
            $sink,
            $crate::ext::ohmlog::LogLevel::Warn,
            $( $arg )*
        );
    };
}

#[macro_export]
macro_rules! ohmerror {
    (
        $sink:expr,
        $( $arg:tt )*
    ) => {
        $crate::ohmlog!(
            $sink,
            $crate::ext::ohmlog::LogLevel::Error,
            $( $arg )*
        );
    };
}
