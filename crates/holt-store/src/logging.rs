//! Log level plumbing for bootstrap

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Raw log level as handed over by the host: 0 debug, 1 info, 2 warning,
/// 3 error, 4 none. Anything else is treated as info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub i32);

impl LogLevel {
    pub const DEBUG: LogLevel = LogLevel(0);
    pub const INFO: LogLevel = LogLevel(1);
    pub const WARNING: LogLevel = LogLevel(2);
    pub const ERROR: LogLevel = LogLevel(3);
    pub const NONE: LogLevel = LogLevel(4);

    pub fn filter(self) -> LevelFilter {
        match self.0 {
            0 => LevelFilter::DEBUG,
            2 => LevelFilter::WARN,
            3 => LevelFilter::ERROR,
            4 => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }
}

/// Install a fmt subscriber at `level`. `RUST_LOG` directives still apply on
/// top. If a global subscriber already exists it is left in place.
pub fn install(level: LogLevel) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(level.filter().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::DEBUG.filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::INFO.filter(), LevelFilter::INFO);
        assert_eq!(LogLevel::WARNING.filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::ERROR.filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::NONE.filter(), LevelFilter::OFF);
        assert_eq!(LogLevel(42).filter(), LevelFilter::INFO);
        assert_eq!(LogLevel(-1).filter(), LevelFilter::INFO);
    }
}
