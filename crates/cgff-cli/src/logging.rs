use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt,
    prelude::*,
    registry::LookupSpan,
};

/// Filter directives in this variable replace the level chosen with `-v`.
pub const LOG_ENV: &str = "CGFF_LOG";

/// Logging choices taken from the global command-line flags.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbosity: u8,
    pub quiet: bool,
    pub file: Option<PathBuf>,
}

impl From<&GlobalArgs> for LogOptions {
    fn from(global: &GlobalArgs) -> Self {
        Self {
            verbosity: global.verbose,
            quiet: global.quiet,
            file: global.log_file.clone(),
        }
    }
}

impl LogOptions {
    /// Level for cgff's own events. `-q` silences everything.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::OFF;
        }
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Dependencies stay at `warn` however verbose cgff itself is.
    fn default_directives(&self) -> String {
        let level = self.level();
        if level == LevelFilter::OFF {
            return "off".to_string();
        }
        format!("warn,cgff={}", level.to_string().to_ascii_lowercase())
    }

    /// Builds the event filter. `env` holds the value of [`LOG_ENV`], if set; it is
    /// ignored under `-q`.
    pub fn filter(&self, env: Option<&str>) -> Result<EnvFilter> {
        let directives = match env.map(str::trim).filter(|d| !d.is_empty()) {
            Some(custom) if !self.quiet => custom.to_string(),
            _ => self.default_directives(),
        };
        EnvFilter::try_new(&directives).map_err(|e| {
            CliError::Config(format!("Invalid {} directives '{}': {}", LOG_ENV, directives, e))
        })
    }
}

/// Appends plain-text events, with targets and thread ids, to `path`.
fn file_layer<S>(path: &Path) -> Result<impl Layer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true))
}

/// Installs the global subscriber: compact events on stderr, plus a log file when
/// one was requested.
pub fn setup_logging(options: &LogOptions) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = options.filter(env.as_deref())?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    let installed = match &options.file {
        Some(path) => registry.with(file_layer(path)?).try_init(),
        None => registry.try_init(),
    };
    installed.map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tracing::{debug, info, trace};

    fn options(verbosity: u8, quiet: bool) -> LogOptions {
        LogOptions {
            verbosity,
            quiet,
            file: None,
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(options(0, false).level(), LevelFilter::WARN);
        assert_eq!(options(1, false).level(), LevelFilter::INFO);
        assert_eq!(options(2, false).level(), LevelFilter::DEBUG);
        assert_eq!(options(7, false).level(), LevelFilter::TRACE);
        assert_eq!(options(3, true).level(), LevelFilter::OFF);
    }

    #[test]
    fn options_follow_global_flags() {
        let global = GlobalArgs {
            verbose: 2,
            log_file: Some(PathBuf::from("cgff.log")),
            ..Default::default()
        };
        let opts = LogOptions::from(&global);
        assert_eq!(opts.level(), LevelFilter::DEBUG);
        assert_eq!(opts.file.as_deref(), Some(Path::new("cgff.log")));
    }

    #[test]
    fn filter_raises_only_cgff_targets() {
        let filter = options(2, false).filter(None).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(options(0, false).default_directives(), "warn,cgff=warn");
    }

    #[test]
    fn env_directives_replace_verbosity_unless_quiet() {
        let filter = options(0, false).filter(Some("cgff=trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = options(0, false).filter(Some("  ")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = options(0, true).filter(Some("cgff=trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::OFF));
    }

    #[test]
    fn malformed_env_directives_are_a_config_error() {
        assert!(matches!(
            options(0, false).filter(Some("cgff=loudest")),
            Err(CliError::Config(msg)) if msg.contains(LOG_ENV)
        ));
    }

    #[test]
    fn file_layer_appends_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cgff.log");
        fs::write(&path, "earlier run\n").unwrap();

        let subscriber = tracing_subscriber::registry()
            .with(options(2, false).filter(None).unwrap())
            .with(file_layer(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            debug!("normalizing sample.yaml");
            trace!("dropped by the filter");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert!(content.contains("normalizing sample.yaml"));
        assert!(content.contains("DEBUG"));
        assert!(!content.contains("dropped by the filter"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    fn file_layer_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            file_layer::<tracing_subscriber::Registry>(dir.path()),
            Err(CliError::Io(_))
        ));
    }

    #[test]
    #[serial]
    fn logger_installs_once() {
        assert!(setup_logging(&options(1, false)).is_ok());
        info!("logger installed");
        assert!(matches!(
            setup_logging(&options(0, true)),
            Err(CliError::Other(_))
        ));
    }
}
