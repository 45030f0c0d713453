use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "rotor_engine=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

static INIT: Once = Once::new();

/// Modules whose info output drowns the harness's own.
const QUIET_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Initializes the global logger once.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info` with the
/// GPU stack held at `warn`. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let env = std::env::var("RUST_LOG").ok();
        let mut builder = builder_for(&config, env.as_deref());
        if install(&mut builder) {
            log::debug!("logging initialized");
        }
    });
}

fn builder_for(config: &LoggingConfig, env_filter: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    match config.env_filter.as_deref().or(env_filter) {
        Some(filter) => {
            builder.parse_filters(filter);
        }
        None => {
            builder.filter_level(log::LevelFilter::Info);
            for module in QUIET_MODULES {
                builder.filter_module(module, log::LevelFilter::Warn);
            }
        }
    }

    builder.write_style(config.write_style);
    builder
}

/// Installs `builder` as the global logger.
///
/// Returns `false` when the host already installed one; that logger stays active
/// and the conflict is reported on stderr, since `log` output would go to it.
fn install(builder: &mut env_logger::Builder) -> bool {
    match builder.try_init() {
        Ok(()) => true,
        Err(err) => {
            eprintln!("rotor-engine: keeping existing logger: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn enabled(logger: &env_logger::Logger, target: &str, level: log::Level) -> bool {
        logger.enabled(&log::Metadata::builder().target(target).level(level).build())
    }

    // ── filters ───────────────────────────────────────────────────────────

    #[test]
    fn default_filter_quiets_gpu_stack() {
        let logger = builder_for(&LoggingConfig::default(), None).build();

        assert_eq!(logger.filter(), log::LevelFilter::Info);
        assert!(enabled(&logger, "rotor_engine", log::Level::Info));
        assert!(!enabled(&logger, "wgpu_core", log::Level::Info));
        assert!(enabled(&logger, "naga", log::Level::Warn));
    }

    #[test]
    fn config_filter_wins_over_environment() {
        let config = LoggingConfig::with_filter("rotor_engine=debug");
        let logger = builder_for(&config, Some("error")).build();
        assert!(enabled(&logger, "rotor_engine", log::Level::Debug));

        let logger = builder_for(&LoggingConfig::default(), Some("error")).build();
        assert!(!enabled(&logger, "rotor_engine", log::Level::Warn));
    }

    // ── install ───────────────────────────────────────────────────────────

    #[test]
    fn second_install_reports_conflict() {
        let config = LoggingConfig::default();
        init_logging(config.clone());

        // Either init_logging or another test already holds the global slot.
        assert!(!install(&mut builder_for(&config, None)));
        init_logging(config);
        log::debug!("still alive");
    }
}
