use crate::error::ImportError;
use crate::files::{append_record, data_line, read_records};
use chrono::NaiveDate;
use core_types::{Constructor, Driver, Round, RoundNumber, RoundType};
use database::{DbError, DbRepository};
use serde::Deserialize;
use std::path::Path;

/// What an import did with the rows it read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Rows whose key was already stored. They are left untouched.
    pub skipped: usize,
}

impl ImportSummary {
    fn record(&mut self, added: bool) {
        if added {
            self.added += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// A calendar row. `round_type` is free text such as `Sprint` or `Standard`.
#[derive(Debug, Deserialize)]
struct RoundRecord {
    round_number: RoundNumber,
    round_name: String,
    country: String,
    circuit: String,
    round_date: NaiveDate,
    round_type: String,
}

/// Imports `name,trigramme,car_number,nationality` rows.
pub async fn import_drivers(
    repo: &DbRepository,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let drivers: Vec<Driver> = read_records(path)?;
    let mut summary = ImportSummary::default();

    for driver in &drivers {
        tracing::info!(
            car_number = driver.car_number,
            trigramme = %driver.trigramme,
            name = %driver.name,
            "Importing driver."
        );
        summary.record(repo.save_driver(driver).await?);
    }

    tracing::info!(
        file = %path.display(),
        added = summary.added,
        skipped = summary.skipped,
        "Drivers imported."
    );
    Ok(summary)
}

/// Imports `full_name,result_name,short_name,paddock_number` rows.
pub async fn import_constructors(
    repo: &DbRepository,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let constructors: Vec<Constructor> = read_records(path)?;
    let mut summary = ImportSummary::default();

    for constructor in &constructors {
        tracing::info!(
            paddock_number = constructor.paddock_number,
            name = %constructor.full_name,
            "Importing constructor."
        );
        summary.record(repo.save_constructor(constructor).await?);
    }

    tracing::info!(
        file = %path.display(),
        added = summary.added,
        skipped = summary.skipped,
        "Constructors imported."
    );
    Ok(summary)
}

/// Imports `round_number,round_name,country,circuit,round_date,round_type` rows.
/// Every imported round starts out not completed.
pub async fn import_rounds(
    repo: &DbRepository,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let records: Vec<RoundRecord> = read_records(path)?;

    // Validate the whole calendar before storing any of it.
    let mut rounds = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let round_type: RoundType =
            record
                .round_type
                .parse()
                .map_err(|e: core_types::CoreError| ImportError::InvalidRow {
                    path: path.to_path_buf(),
                    line: data_line(index),
                    reason: e.to_string(),
                })?;
        rounds.push(Round {
            round_number: record.round_number,
            round_name: record.round_name,
            country: record.country,
            circuit: record.circuit,
            round_date: record.round_date,
            round_type,
            completed: false,
        });
    }

    let mut summary = ImportSummary::default();
    for round in &rounds {
        tracing::info!(round = round.round_number, name = %round.round_name, "Importing round.");
        summary.record(repo.save_round(round).await?);
    }

    tracing::info!(
        file = %path.display(),
        added = summary.added,
        skipped = summary.skipped,
        "Rounds imported."
    );
    Ok(summary)
}

/// Checks a driver entered by hand: a non-empty name, a trigramme of three
/// upper-case ASCII letters and a car number between 1 and 99.
pub fn validate_driver(driver: &Driver) -> Result<(), ImportError> {
    if driver.name.trim().is_empty() {
        return Err(ImportError::InvalidDriver("name must not be empty".to_string()));
    }
    let trigramme = driver.trigramme.as_bytes();
    if trigramme.len() != 3 || !trigramme.iter().all(u8::is_ascii_uppercase) {
        return Err(ImportError::InvalidDriver(format!(
            "trigramme '{}' must be three upper-case letters",
            driver.trigramme
        )));
    }
    if !(1..=99).contains(&driver.car_number) {
        return Err(ImportError::InvalidDriver(format!(
            "car number {} must be between 1 and 99",
            driver.car_number
        )));
    }
    Ok(())
}

/// Adds a new driver to the roster file and then to the database, so a later
/// re-import keeps it. Nothing is stored when the file cannot be written.
pub async fn add_driver(
    repo: &DbRepository,
    drivers_file: &Path,
    driver: &Driver,
) -> Result<(), ImportError> {
    validate_driver(driver)?;

    let already_exists = || ImportError::DriverAlreadyExists {
        car_number: driver.car_number,
        trigramme: driver.trigramme.clone(),
    };
    if repo.get_driver(driver.car_number).await?.is_some()
        || repo.get_driver_by_trigramme(&driver.trigramme).await?.is_some()
    {
        return Err(already_exists());
    }

    append_record(drivers_file, driver)?;
    match repo.save_driver(driver).await {
        Ok(true) => {}
        Ok(false) | Err(DbError::DuplicateTrigramme { .. }) => return Err(already_exists()),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        car_number = driver.car_number,
        trigramme = %driver.trigramme,
        file = %drivers_file.display(),
        "Driver added to the roster."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::in_memory_repository;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn driver(name: &str, trigramme: &str, car_number: u32) -> Driver {
        Driver {
            name: name.to_string(),
            trigramme: trigramme.to_string(),
            car_number,
            nationality: "British".to_string(),
        }
    }

    #[tokio::test]
    async fn drivers_import_skips_known_car_numbers() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Drivers.csv",
            "name, trigramme, car_number, nationality\n\
             Lando Norris, NOR, 4, British\n\
             Oscar Piastri, PIA, 81, Australian\n",
        );
        let repo = in_memory_repository().await.unwrap();

        let first = import_drivers(&repo, &path).await.unwrap();
        let second = import_drivers(&repo, &path).await.unwrap();

        assert_eq!(
            first,
            ImportSummary {
                added: 2,
                skipped: 0,
            }
        );
        assert_eq!(
            second,
            ImportSummary {
                added: 0,
                skipped: 2,
            }
        );
        let piastri = repo.get_driver(81).await.unwrap().unwrap();
        assert_eq!(piastri.trigramme, "PIA");
        assert_eq!(piastri.nationality, "Australian");
    }

    #[tokio::test]
    async fn constructors_are_found_by_result_name() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Constructors.csv",
            "full_name,result_name,short_name,paddock_number\n\
             McLaren Formula 1 Team,McLaren Mercedes,McLaren,2\n\
             \"Oracle Red Bull Racing\",\"Red Bull Racing Honda RBPT\",Red Bull,1\n",
        );
        let repo = in_memory_repository().await.unwrap();

        let summary = import_constructors(&repo, &path).await.unwrap();

        assert_eq!(summary.added, 2);
        let red_bull = repo
            .get_constructor_by_result_name("Red Bull Racing Honda RBPT")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(red_bull.paddock_number, 1);
        assert_eq!(red_bull.full_name, "Oracle Red Bull Racing");
    }

    #[tokio::test]
    async fn rounds_import_parses_dates_and_weekend_types() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Rounds.csv",
            "round_number,round_name,country,circuit,round_date,round_type\n\
             1,Bahrain Grand Prix,Bahrain,Bahrain International Circuit,2024-03-02,Standard\n\
             5,Chinese Grand Prix,China,Shanghai International Circuit,2024-04-21,Sprint\n",
        );
        let repo = in_memory_repository().await.unwrap();

        import_rounds(&repo, &path).await.unwrap();

        let rounds = repo.get_all_rounds().await.unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].round_date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(rounds[1].round_type, RoundType::Sprint);
        assert!(!rounds[1].completed);
    }

    #[tokio::test]
    async fn bad_round_type_rejects_the_whole_calendar() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Rounds.csv",
            "round_number,round_name,country,circuit,round_date,round_type\n\
             1,Bahrain Grand Prix,Bahrain,Sakhir,2024-03-02,Standard\n\
             2,Saudi Arabian Grand Prix,Saudi Arabia,Jeddah,2024-03-09,Endurance\n",
        );
        let repo = in_memory_repository().await.unwrap();

        let result = import_rounds(&repo, &path).await;

        assert!(matches!(result, Err(ImportError::InvalidRow { line: 3, .. })));
        assert!(repo.get_all_rounds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let repo = in_memory_repository().await.unwrap();

        let result = import_drivers(&repo, &dir.path().join("Drivers.csv")).await;

        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn hand_entered_drivers_are_validated() {
        assert!(validate_driver(&driver("Lando Norris", "NOR", 4)).is_ok());
        assert!(validate_driver(&driver("Lando Norris", "NOR", 99)).is_ok());

        for bad in [
            driver("", "NOR", 4),
            driver("Lando Norris", "nor", 4),
            driver("Lando Norris", "NORR", 4),
            driver("Lando Norris", "N0R", 4),
            driver("Lando Norris", "NOR", 0),
            driver("Lando Norris", "NOR", 100),
        ] {
            assert!(matches!(validate_driver(&bad), Err(ImportError::InvalidDriver(_))));
        }
    }

    #[tokio::test]
    async fn added_driver_is_stored_and_appended_to_the_roster_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Drivers.csv",
            "name,trigramme,car_number,nationality\nLando Norris,NOR,4,British\n",
        );
        let repo = in_memory_repository().await.unwrap();
        import_drivers(&repo, &path).await.unwrap();

        add_driver(&repo, &path, &driver("Oliver Bearman", "BEA", 38)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "name,trigramme,car_number,nationality\n\
             Lando Norris,NOR,4,British\n\
             Oliver Bearman,BEA,38,British\n"
        );
        assert!(repo.get_driver_by_trigramme("BEA").await.unwrap().is_some());

        let again = add_driver(&repo, &path, &driver("Someone Else", "BEA", 39)).await;
        assert!(matches!(again, Err(ImportError::DriverAlreadyExists { .. })));
        assert!(repo.get_driver(39).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn added_driver_creates_a_missing_roster_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("Drivers.csv");
        let repo = in_memory_repository().await.unwrap();

        add_driver(&repo, &path, &driver("Lando Norris", "NOR", 4)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "name,trigramme,car_number,nationality\nLando Norris,NOR,4,British\n"
        );
    }

    #[tokio::test]
    async fn driver_is_not_stored_when_the_roster_file_cannot_be_written() {
        let dir = TempDir::new().unwrap();
        let repo = in_memory_repository().await.unwrap();

        let result = add_driver(&repo, dir.path(), &driver("Oliver Bearman", "BEA", 38)).await;

        assert!(matches!(result, Err(ImportError::Write { .. })));
        assert!(repo.get_driver(38).await.unwrap().is_none());
        assert!(repo.get_driver_by_trigramme("BEA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_driver_leaves_the_roster_file_untouched() {
        let dir = TempDir::new().unwrap();
        let original = "name,trigramme,car_number,nationality\nLando Norris,NOR,4,British\n";
        let path = write_file(&dir, "Drivers.csv", original);
        let repo = in_memory_repository().await.unwrap();
        import_drivers(&repo, &path).await.unwrap();

        let same_car = add_driver(&repo, &path, &driver("Someone Else", "SOM", 4)).await;
        let same_trigramme = add_driver(&repo, &path, &driver("Someone Else", "NOR", 5)).await;

        assert!(matches!(same_car, Err(ImportError::DriverAlreadyExists { car_number: 4, .. })));
        assert!(matches!(
            same_trigramme,
            Err(ImportError::DriverAlreadyExists { car_number: 5, .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert!(repo.get_driver(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn trigramme_clash_in_a_roster_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "Drivers.csv",
            "name,trigramme,car_number,nationality\n\
             Lando Norris,NOR,4,British\n\
             Somebody Else,NOR,5,British\n",
        );
        let repo = in_memory_repository().await.unwrap();

        let result = import_drivers(&repo, &path).await;

        assert!(matches!(
            result,
            Err(ImportError::Database(DbError::DuplicateTrigramme { car_number: 5, .. }))
        ));
        assert!(repo.get_driver(5).await.unwrap().is_none());
    }
}
