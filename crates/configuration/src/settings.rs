use crate::error::ConfigError;
use core_types::Championship;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// describes the current Formula 1 scoring rules with the files laid out the
/// way the CSV import expects them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub data: DataFiles,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub contention: ContentionSettings,
}

/// Where the season database lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// A sqlx SQLite URL, e.g. `sqlite://data/database/stats-database.sqlite`.
    pub url: String,
}

/// Locations of the roster, calendar and session-result CSV files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub drivers_file: PathBuf,
    pub constructors_file: PathBuf,
    pub rounds_file: PathBuf,
    /// Session sheets passed to `add-results` are resolved against this folder.
    pub results_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file_name: String,
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,
}

/// Points awarded by finishing position, P1 first.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub race_points: Vec<u32>,
    pub sprint_points: Vec<u32>,
}

/// The most points one entrant can still collect per remaining event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ContentionCeiling {
    pub max_race_points: u32,
    pub max_sprint_points: u32,
}

/// Ceilings for both championships. Constructors field two cars, so their
/// ceiling is a one-two finish rather than a single win.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentionSettings {
    pub drivers: ContentionCeiling,
    pub constructors: ContentionCeiling,
}

impl ContentionSettings {
    pub fn ceiling(&self, championship: Championship) -> ContentionCeiling {
        match championship {
            Championship::Drivers => self.drivers,
            Championship::Constructors => self.constructors,
        }
    }
}

// --- Default Implementations ---

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://data/database/stats-database.sqlite".to_string(),
        }
    }
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            drivers_file: PathBuf::from("data/Drivers.csv"),
            constructors_file: PathBuf::from("data/Constructors.csv"),
            rounds_file: PathBuf::from("data/Rounds.csv"),
            results_folder: PathBuf::from("data/results"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "stats.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            race_points: vec![25, 18, 15, 12, 10, 8, 6, 4, 2, 1],
            sprint_points: vec![8, 7, 6, 5, 4, 3, 2, 1],
        }
    }
}

impl Default for ContentionSettings {
    fn default() -> Self {
        Self {
            drivers: ContentionCeiling {
                max_race_points: 25,
                max_sprint_points: 8,
            },
            constructors: ContentionCeiling {
                max_race_points: 25 + 18,
                max_sprint_points: 8 + 7,
            },
        }
    }
}

impl Config {
    /// Rejects settings the standings engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let race_winner = first_place(&self.scoring.race_points, "scoring.race_points")?;
        let sprint_winner = first_place(&self.scoring.sprint_points, "scoring.sprint_points")?;

        for (name, ceiling) in [
            ("contention.drivers", self.contention.drivers),
            ("contention.constructors", self.contention.constructors),
        ] {
            if ceiling.max_race_points < race_winner {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.max_race_points ({}) is below the race winner's points ({race_winner})",
                    ceiling.max_race_points
                )));
            }
            if ceiling.max_sprint_points < sprint_winner {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.max_sprint_points ({}) is below the sprint winner's points \
                     ({sprint_winner})",
                    ceiling.max_sprint_points
                )));
            }
        }

        Ok(())
    }
}

fn first_place(table: &[u32], name: &str) -> Result<u32, ConfigError> {
    table
        .first()
        .copied()
        .ok_or_else(|| ConfigError::ValidationError(format!("{name} must not be empty")))
}
