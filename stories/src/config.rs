//! Command line options, environment and logging setup.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use stories_core::PlaybackConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STORIES_DATA_DIR";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "STORIES_LOG";

/// Options gathered from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub headless: bool,
    pub help: bool,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
}

impl Options {
    /// Parse `args` (including the program name).
    ///
    /// `env_data_dir` and `home` stand in for the environment so parsing
    /// stays testable.
    pub fn parse(
        args: &[String],
        env_data_dir: Option<String>,
        home: Option<String>,
    ) -> Result<Self, String> {
        let mut options = Self {
            headless: false,
            help: false,
            data_dir: default_data_dir(env_data_dir, home),
            tick_interval: PlaybackConfig::default().tick_interval,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--headless" => options.headless = true,
                "--help" | "-h" => options.help = true,
                "--data-dir" => {
                    let value = args.get(i + 1).ok_or("--data-dir needs a path")?;
                    options.data_dir = PathBuf::from(value);
                    i += 1;
                }
                "--tick-ms" => {
                    let value = args.get(i + 1).ok_or("--tick-ms needs a number")?;
                    let ms: u64 = value
                        .parse()
                        .map_err(|_| format!("invalid --tick-ms value '{value}'"))?;
                    if ms == 0 {
                        return Err("--tick-ms must be at least 1".to_string());
                    }
                    options.tick_interval = Duration::from_millis(ms);
                    i += 1;
                }
                other => return Err(format!("unknown argument '{other}'")),
            }
            i += 1;
        }

        Ok(options)
    }

    /// Parse the real process arguments and environment.
    pub fn from_env() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(
            &args,
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var("HOME").ok(),
        )
    }

    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig::new().with_tick_interval(self.tick_interval)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("stories.log")
    }
}

fn default_data_dir(env_data_dir: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = env_data_dir.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    match home.filter(|h| !h.trim().is_empty()) {
        Some(home) => Path::new(&home).join(".stories"),
        None => PathBuf::from(".stories"),
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Log to stderr. Used by headless mode, where stdout carries the protocol.
pub fn init_stderr_logging() {
    use tracing_subscriber::{fmt, prelude::*};

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Log to a file so the terminal UI is not overwritten.
pub fn init_file_logging(path: &Path) -> std::io::Result<()> {
    use tracing_subscriber::{fmt, prelude::*};

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

pub fn print_help() {
    println!("stories - ephemeral stories in your terminal");
    println!();
    println!("USAGE:");
    println!("  stories [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --headless          Line-oriented mode reading commands from stdin");
    println!("  --data-dir <PATH>   Where stories are stored (default: ~/.stories)");
    println!("  --tick-ms <N>       Playback tick interval in milliseconds (default: 100)");
    println!();
    println!("ENVIRONMENT:");
    println!("  {DATA_DIR_ENV}    Data directory, overridden by --data-dir");
    println!("  {LOG_ENV}          Log filter, e.g. debug or stories_core=trace");
    println!();
    println!("EXAMPLES:");
    println!("  stories                                # Interactive TUI mode");
    println!("  stories --headless < script.txt        # Scripted session");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("stories")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults() {
        let options = Options::parse(&args(&[]), None, Some("/home/me".into())).unwrap();
        assert!(!options.headless);
        assert_eq!(options.data_dir, PathBuf::from("/home/me/.stories"));
        assert_eq!(options.tick_interval, Duration::from_millis(100));
        assert_eq!(options.log_path(), PathBuf::from("/home/me/.stories/stories.log"));
    }

    #[test]
    fn test_data_dir_precedence() {
        let from_env =
            Options::parse(&args(&[]), Some("/srv/stories".into()), Some("/home/me".into()))
                .unwrap();
        assert_eq!(from_env.data_dir, PathBuf::from("/srv/stories"));

        let from_flag = Options::parse(
            &args(&["--data-dir", "./local"]),
            Some("/srv/stories".into()),
            None,
        )
        .unwrap();
        assert_eq!(from_flag.data_dir, PathBuf::from("./local"));

        let fallback = Options::parse(&args(&[]), None, None).unwrap();
        assert_eq!(fallback.data_dir, PathBuf::from(".stories"));
    }

    #[test]
    fn test_flags() {
        let options =
            Options::parse(&args(&["--headless", "--tick-ms", "250", "-h"]), None, None).unwrap();
        assert!(options.headless);
        assert!(options.help);
        assert_eq!(options.playback().tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(Options::parse(&args(&["--tick-ms"]), None, None).is_err());
        assert!(Options::parse(&args(&["--tick-ms", "fast"]), None, None).is_err());
        assert!(Options::parse(&args(&["--tick-ms", "0"]), None, None).is_err());
        assert!(Options::parse(&args(&["--data-dir"]), None, None).is_err());
        assert!(Options::parse(&args(&["--author", "Ada"]), None, None).is_err());
    }
}
