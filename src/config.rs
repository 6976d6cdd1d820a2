//! Server configuration (§6 CLI).
//!
//! `server [-f] <port> <devfile>`: `-f` formats the superblock (bumping
//! the generation if one is already valid, else initializing a fresh
//! layout); `<devfile>` is the backing device or file, created if
//! absent and `-f` was given.

use std::fmt;
use std::path::PathBuf;

use crate::durability::recovery::StartupMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub devfile: PathBuf,
    pub startup_mode: StartupMode,
}

#[derive(Debug)]
pub struct UsageError(String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "usage: server [-f] <port> <devfile>: {}", self.0)
    }
}

impl std::error::Error for UsageError {}

impl Config {
    /// Parses `args` (excluding argv[0]).
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, UsageError> {
        let mut rest: Vec<String> = args.into_iter().collect();

        let format = if rest.first().map(String::as_str) == Some("-f") {
            rest.remove(0);
            true
        } else {
            false
        };

        if rest.len() != 2 {
            return Err(UsageError(format!("expected 2 positional args, got {}", rest.len())));
        }

        let port: u16 = rest[0]
            .parse()
            .map_err(|_| UsageError(format!("invalid port {:?}", rest[0])))?;
        let devfile = PathBuf::from(&rest[1]);

        Ok(Config {
            port,
            devfile,
            startup_mode: if format { StartupMode::Format } else { StartupMode::Normal },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_normal_startup() {
        let cfg = Config::from_args(args(&["8080", "/tmp/graph.dat"])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.devfile, PathBuf::from("/tmp/graph.dat"));
        assert_eq!(cfg.startup_mode, StartupMode::Normal);
    }

    #[test]
    fn parses_format_flag() {
        let cfg = Config::from_args(args(&["-f", "9090", "dev.img"])).unwrap();
        assert_eq!(cfg.startup_mode, StartupMode::Format);
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn rejects_wrong_arg_count() {
        assert!(Config::from_args(args(&["8080"])).is_err());
        assert!(Config::from_args(args(&["-f", "8080", "a", "b"])).is_err());
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Config::from_args(args(&["notaport", "dev.img"])).is_err());
    }
}
