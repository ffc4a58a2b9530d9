use crate::error::ConfigError;
use std::path::{Path, PathBuf};

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, ContentionCeiling, ContentionSettings, DataFiles, DatabaseSettings, LoggingSettings,
    ScoringSettings,
};

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Command-line options that select and override the configuration.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Path to the configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `database.url`.
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[cfg(feature = "clap")]
impl ConfigArgs {
    /// Loads the configuration this invocation asked for.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        Ok(config)
    }
}

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones: built-in defaults, the TOML
/// file, then `GRIDSTATS__SECTION__KEY` environment variables. An explicit
/// `path` must exist; the default `config.toml` is optional.
pub fn load_config_from(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path.to_path_buf()).required(true),
        None => config::File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("GRIDSTATS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_follow_current_scoring_rules() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.scoring.race_points, vec![25, 18, 15, 12, 10, 8, 6, 4, 2, 1]);
        assert_eq!(config.scoring.sprint_points, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(
            config.contention.ceiling(core_types::Championship::Drivers),
            ContentionCeiling {
                max_race_points: 25,
                max_sprint_points: 8
            }
        );
        assert_eq!(
            config.contention.ceiling(core_types::Championship::Constructors),
            ContentionCeiling {
                max_race_points: 43,
                max_sprint_points: 15
            }
        );
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let file = write_config(
            r#"
            [database]
            url = "sqlite://season.sqlite"

            [contention.drivers]
            max_race_points = 26
            max_sprint_points = 8

            [contention.constructors]
            max_race_points = 44
            max_sprint_points = 15
            "#,
        );

        let config = load_config_from(Some(file.path())).unwrap();

        assert_eq!(config.database.url, "sqlite://season.sqlite");
        assert_eq!(config.contention.drivers.max_race_points, 26);
        assert_eq!(config.contention.constructors.max_race_points, 44);
        assert_eq!(config.logging.file_name, "stats.log");
        assert_eq!(config.data.results_folder, PathBuf::from("data/results"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = load_config_from(Some(Path::new("definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn ceiling_below_winner_points_is_rejected() {
        let file = write_config(
            r#"
            [contention.drivers]
            max_race_points = 20
            max_sprint_points = 8
            "#,
        );

        let result = load_config_from(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn empty_points_table_is_rejected() {
        let mut config = Config::default();
        config.scoring.sprint_points.clear();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }
}
