//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::state::SessionConfig;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "simple-pomodoro")]
#[command(about = "A Pomodoro timer server with a persistent work log")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20525")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Number of work/rest loops per session (1-99)
    #[arg(short, long, default_value = "4")]
    pub loops: u32,

    /// Work phase length in minutes (1-99)
    #[arg(short, long, default_value = "25")]
    pub work: u32,

    /// Short rest length in minutes (1-99)
    #[arg(short, long, default_value = "5")]
    pub rest: u32,

    /// Long rest length in minutes, taken after every fourth loop (1-99)
    #[arg(long, default_value = "15")]
    pub long_rest: u32,

    /// Always use the short rest, even after every fourth loop
    #[arg(long)]
    pub no_long_rest: bool,

    /// Work log file [default: <data dir>/simple-pomodoro/worklog.json]
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Initial session configuration, clamped into range
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            self.loops,
            self.work,
            self.rest,
            self.long_rest,
            !self.no_long_rest,
        )
    }

    /// Where the work log lives
    pub fn data_file(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("simple-pomodoro")
                .join("worklog.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["simple-pomodoro"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:20525");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.session_config(), SessionConfig::default());
        assert!(config.data_file().ends_with("simple-pomodoro/worklog.json"));
    }

    #[test]
    fn test_session_flags_are_clamped() {
        let config = Config::try_parse_from([
            "simple-pomodoro",
            "--loops",
            "0",
            "--work",
            "240",
            "--no-long-rest",
            "--data-file",
            "/tmp/log.json",
            "-v",
        ])
        .unwrap();

        let session = config.session_config();
        assert_eq!(session.target_loops, 1);
        assert_eq!(session.work_minutes, 99);
        assert!(!session.supports_long_rest);
        assert_eq!(config.data_file(), PathBuf::from("/tmp/log.json"));
        assert_eq!(config.log_level(), "debug");
    }
}
