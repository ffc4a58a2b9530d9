use crate::DbError;
use crate::error::is_unique_violation;
use core_types::{
    CarNumber, Championship, Constructor, Driver, EntrantKey, FinishingPosition, PaddockNumber,
    Points, RankingEntry, ResultTime, Round, RoundNumber, RoundType, SessionResult, SessionType,
};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Row, Transaction};
use std::collections::HashMap;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// Rounds per event type, as counted on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    /// Every round runs a race.
    pub races: u32,
    pub sprints: u32,
}

/// Table and column names of one championship's ranking table.
struct RankingTable {
    table: &'static str,
    key: &'static str,
    position: &'static str,
    points: &'static str,
}

fn ranking_table(championship: Championship) -> RankingTable {
    match championship {
        Championship::Drivers => RankingTable {
            table: "drivers_ranking",
            key: "car_number",
            position: "car_position",
            points: "car_points",
        },
        Championship::Constructors => RankingTable {
            table: "constructors_ranking",
            key: "paddock_number",
            position: "constructor_position",
            points: "constructor_points",
        },
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Roster
    // ==========================================================================

    /// Saves a driver. Returns `false` if the car number was already on the roster.
    /// A trigramme held by a different car number is an error, not a skip.
    pub async fn save_driver(&self, driver: &Driver) -> Result<bool, DbError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO drivers (car_number, name, trigramme, nationality)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (car_number) DO NOTHING
            "#,
        )
        .bind(driver.car_number)
        .bind(&driver.name)
        .bind(&driver.trigramme)
        .bind(&driver.nationality)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::DuplicateTrigramme {
                    trigramme: driver.trigramme.clone(),
                    car_number: driver.car_number,
                }
            } else {
                e.into()
            }
        })?;
        Ok(outcome.rows_affected() == 1)
    }

    /// Saves a constructor. Returns `false` if its paddock number was already on
    /// the roster.
    pub async fn save_constructor(&self, constructor: &Constructor) -> Result<bool, DbError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO constructors (paddock_number, full_name, result_name, short_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (paddock_number) DO NOTHING
            "#,
        )
        .bind(constructor.paddock_number)
        .bind(&constructor.full_name)
        .bind(&constructor.result_name)
        .bind(&constructor.short_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::DuplicateResultName(constructor.result_name.clone())
            } else {
                e.into()
            }
        })?;
        Ok(outcome.rows_affected() == 1)
    }

    pub async fn get_driver_by_trigramme(
        &self,
        trigramme: &str,
    ) -> Result<Option<Driver>, DbError> {
        let row = sqlx::query(
            "SELECT car_number, name, trigramme, nationality FROM drivers WHERE trigramme = $1",
        )
        .bind(trigramme)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| driver_from_row(&row)).transpose()
    }

    pub async fn get_driver(&self, car_number: CarNumber) -> Result<Option<Driver>, DbError> {
        let row = sqlx::query(
            "SELECT car_number, name, trigramme, nationality FROM drivers WHERE car_number = $1",
        )
        .bind(car_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| driver_from_row(&row)).transpose()
    }

    /// Resolves the name a session sheet prints in its `Car` column.
    pub async fn get_constructor_by_result_name(
        &self,
        result_name: &str,
    ) -> Result<Option<Constructor>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT paddock_number, full_name, result_name, short_name
            FROM constructors
            WHERE result_name = $1
            "#,
        )
        .bind(result_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| constructor_from_row(&row)).transpose()
    }

    pub async fn get_all_drivers(&self) -> Result<Vec<Driver>, DbError> {
        let rows = sqlx::query(
            "SELECT car_number, name, trigramme, nationality FROM drivers ORDER BY car_number ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(driver_from_row).collect()
    }

    pub async fn get_all_constructors(&self) -> Result<Vec<Constructor>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT paddock_number, full_name, result_name, short_name
            FROM constructors
            ORDER BY paddock_number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(constructor_from_row).collect()
    }

    /// Every car number on the roster, ascending.
    pub async fn get_all_car_numbers(&self) -> Result<Vec<CarNumber>, DbError> {
        let numbers = sqlx::query_scalar("SELECT car_number FROM drivers ORDER BY car_number ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(numbers)
    }

    /// Every paddock number on the roster, ascending.
    pub async fn get_all_paddock_numbers(&self) -> Result<Vec<PaddockNumber>, DbError> {
        let numbers =
            sqlx::query_scalar("SELECT paddock_number FROM constructors ORDER BY paddock_number ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(numbers)
    }

    /// The roster keys of one championship.
    pub async fn get_entrant_keys(
        &self,
        championship: Championship,
    ) -> Result<Vec<EntrantKey>, DbError> {
        match championship {
            Championship::Drivers => self.get_all_car_numbers().await,
            Championship::Constructors => self.get_all_paddock_numbers().await,
        }
    }

    // ==========================================================================
    // Calendar
    // ==========================================================================

    /// Saves a round. Returns `false` if that round number already existed.
    pub async fn save_round(&self, round: &Round) -> Result<bool, DbError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO rounds (round_number, round_name, country, circuit, round_date, round_type, round_finished)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (round_number) DO NOTHING
            "#,
        )
        .bind(round.round_number)
        .bind(&round.round_name)
        .bind(&round.country)
        .bind(&round.circuit)
        .bind(round.round_date)
        .bind(round.round_type.as_str())
        .bind(round.completed)
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() == 1)
    }

    pub async fn get_round(&self, round_number: RoundNumber) -> Result<Option<Round>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT round_number, round_name, country, circuit, round_date, round_type, round_finished
            FROM rounds
            WHERE round_number = $1
            "#,
        )
        .bind(round_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| round_from_row(&row)).transpose()
    }

    pub async fn get_all_rounds(&self) -> Result<Vec<Round>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT round_number, round_name, country, circuit, round_date, round_type, round_finished
            FROM rounds
            ORDER BY round_number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(round_from_row).collect()
    }

    /// Races and sprints on the whole calendar.
    pub async fn get_scheduled_counts(&self) -> Result<EventCounts, DbError> {
        self.count_rounds("SELECT round_type FROM rounds").await
    }

    /// Races and sprints of the rounds already marked as completed.
    pub async fn get_completed_counts(&self) -> Result<EventCounts, DbError> {
        self.count_rounds("SELECT round_type FROM rounds WHERE round_finished = TRUE")
            .await
    }

    async fn count_rounds(&self, query: &str) -> Result<EventCounts, DbError> {
        let types: Vec<String> = sqlx::query_scalar(query).fetch_all(&self.pool).await?;
        let mut counts = EventCounts::default();
        for round_type in types {
            counts.races += 1;
            if parse_round_type(&round_type)? == RoundType::Sprint {
                counts.sprints += 1;
            }
        }
        Ok(counts)
    }

    /// The highest round number marked as completed, if any.
    pub async fn get_last_completed_round(&self) -> Result<Option<RoundNumber>, DbError> {
        let last = sqlx::query_scalar(
            "SELECT MAX(round_number) FROM rounds WHERE round_finished = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(last)
    }

    /// Marks a round as completed and stores both of its championship tables
    /// in a single transaction.
    ///
    /// Fails without writing anything if the round was already completed or if
    /// either table already holds entries for this round.
    pub async fn complete_round(
        &self,
        round_number: RoundNumber,
        drivers: &[RankingEntry],
        constructors: &[RankingEntry],
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let finished: Option<bool> =
            sqlx::query_scalar("SELECT round_finished FROM rounds WHERE round_number = $1")
                .bind(round_number)
                .fetch_optional(&mut *tx)
                .await?;
        match finished {
            None => return Err(DbError::NotFound),
            Some(true) => return Err(DbError::RoundAlreadyCompleted(round_number)),
            Some(false) => {}
        }

        sqlx::query("UPDATE rounds SET round_finished = TRUE WHERE round_number = $1")
            .bind(round_number)
            .execute(&mut *tx)
            .await?;

        insert_ranking(&mut tx, Championship::Drivers, round_number, drivers).await?;
        insert_ranking(&mut tx, Championship::Constructors, round_number, constructors).await?;

        tx.commit().await?;
        tracing::info!(round = round_number, "Round marked as completed.");
        Ok(())
    }

    // ==========================================================================
    // Session results
    // ==========================================================================

    /// Saves one session sheet within a single transaction for atomicity.
    ///
    /// A result that already exists for the same round, car and session is
    /// rejected with [`DbError::DuplicateResult`] and nothing is written.
    pub async fn save_session_results(&self, results: &[SessionResult]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        for result in results {
            sqlx::query(
                r#"
                INSERT INTO results (
                    round_number, car_number, session_type, paddock_number,
                    car_position, result_time, car_points
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(result.round_number)
            .bind(result.car_number)
            .bind(result.session_type.as_str())
            .bind(result.paddock_number)
            .bind(result.position.to_string())
            .bind(result.time.to_stored())
            .bind(result.points)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateResult {
                        round: result.round_number,
                        car_number: result.car_number,
                        session: result.session_type,
                    }
                } else {
                    e.into()
                }
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn count_results_for_round(&self, round_number: RoundNumber) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE round_number = $1")
            .bind(round_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }

    pub async fn count_results_for_session(
        &self,
        round_number: RoundNumber,
        session: SessionType,
    ) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM results WHERE round_number = $1 AND session_type = $2",
        )
        .bind(round_number)
        .bind(session.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count.unsigned_abs())
    }

    pub async fn get_results_for_round(
        &self,
        round_number: RoundNumber,
    ) -> Result<Vec<SessionResult>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT round_number, car_number, session_type, paddock_number, car_position, result_time, car_points
            FROM results
            WHERE round_number = $1
            ORDER BY session_type, car_number
            "#,
        )
        .bind(round_number)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(result_from_row).collect()
    }

    /// A driver's results in the given sessions, in round order.
    pub async fn get_results_by_driver(
        &self,
        car_number: CarNumber,
        sessions: &[SessionType],
    ) -> Result<Vec<SessionResult>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT round_number, car_number, session_type, paddock_number, car_position, result_time, car_points
            FROM results
            WHERE car_number = $1
            ORDER BY round_number ASC, session_type ASC
            "#,
        )
        .bind(car_number)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let result = result_from_row(row)?;
            if sessions.contains(&result.session_type) {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Points each entrant scored across all sessions of one round. Entrants
    /// without a result are absent from the map.
    pub async fn get_round_points(
        &self,
        championship: Championship,
        round_number: RoundNumber,
    ) -> Result<HashMap<EntrantKey, Points>, DbError> {
        let key = ranking_table(championship).key;
        let query = format!(
            "SELECT {key} AS entrant, SUM(car_points) AS points FROM results WHERE round_number = $1 GROUP BY {key}"
        );
        let rows = sqlx::query(&query)
            .bind(round_number)
            .fetch_all(&self.pool)
            .await?;

        let mut points = HashMap::with_capacity(rows.len());
        for row in rows {
            let entrant: EntrantKey = row.try_get("entrant")?;
            let total: i64 = row.try_get("points")?;
            let total = Points::try_from(total)
                .map_err(|_| DbError::CorruptRow(format!("{total} points for entrant {entrant}")))?;
            points.insert(entrant, total);
        }
        Ok(points)
    }

    // ==========================================================================
    // Rankings
    // ==========================================================================

    /// The stored table of one championship after `round_number`, by position.
    pub async fn get_ranking(
        &self,
        championship: Championship,
        round_number: RoundNumber,
    ) -> Result<Vec<RankingEntry>, DbError> {
        let t = ranking_table(championship);
        let query = format!(
            r#"
            SELECT round_number, {key} AS entrant, {position} AS position, {points} AS points, championship_chance
            FROM {table}
            WHERE round_number = $1
            ORDER BY {position} ASC
            "#,
            key = t.key,
            position = t.position,
            points = t.points,
            table = t.table,
        );
        let rows = sqlx::query(&query)
            .bind(round_number)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ranking_from_row).collect()
    }

    /// Cumulative points of one entrant after `round_number`, if ranked.
    pub async fn get_points_after_round(
        &self,
        championship: Championship,
        entrant: EntrantKey,
        round_number: RoundNumber,
    ) -> Result<Option<Points>, DbError> {
        let t = ranking_table(championship);
        let query = format!(
            "SELECT {points} FROM {table} WHERE round_number = $1 AND {key} = $2",
            points = t.points,
            table = t.table,
            key = t.key,
        );
        let points = sqlx::query_scalar(&query)
            .bind(round_number)
            .bind(entrant)
            .fetch_optional(&self.pool)
            .await?;
        Ok(points)
    }

    /// The entrant in position 1 after `round_number`.
    pub async fn get_leader(
        &self,
        championship: Championship,
        round_number: RoundNumber,
    ) -> Result<Option<RankingEntry>, DbError> {
        Ok(self
            .get_ranking(championship, round_number)
            .await?
            .into_iter()
            .find(|entry| entry.position == 1))
    }
}

async fn insert_ranking(
    tx: &mut Transaction<'_, Sqlite>,
    championship: Championship,
    round_number: RoundNumber,
    entries: &[RankingEntry],
) -> Result<(), DbError> {
    let t = ranking_table(championship);
    let query = format!(
        "INSERT INTO {table} (round_number, {key}, {position}, {points}, championship_chance) VALUES ($1, $2, $3, $4, $5)",
        table = t.table,
        key = t.key,
        position = t.position,
        points = t.points,
    );

    for entry in entries {
        sqlx::query(&query)
            .bind(round_number)
            .bind(entry.entrant_key)
            .bind(entry.position)
            .bind(entry.points)
            .bind(entry.title_contention)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateRanking {
                        championship,
                        round: round_number,
                    }
                } else {
                    e.into()
                }
            })?;
    }
    Ok(())
}

fn driver_from_row(row: &SqliteRow) -> Result<Driver, DbError> {
    Ok(Driver {
        car_number: row.try_get("car_number")?,
        name: row.try_get("name")?,
        trigramme: row.try_get("trigramme")?,
        nationality: row.try_get("nationality")?,
    })
}

fn constructor_from_row(row: &SqliteRow) -> Result<Constructor, DbError> {
    Ok(Constructor {
        paddock_number: row.try_get("paddock_number")?,
        full_name: row.try_get("full_name")?,
        result_name: row.try_get("result_name")?,
        short_name: row.try_get("short_name")?,
    })
}

fn round_from_row(row: &SqliteRow) -> Result<Round, DbError> {
    let round_type: String = row.try_get("round_type")?;
    Ok(Round {
        round_number: row.try_get("round_number")?,
        round_name: row.try_get("round_name")?,
        country: row.try_get("country")?,
        circuit: row.try_get("circuit")?,
        round_date: row.try_get("round_date")?,
        round_type: parse_round_type(&round_type)?,
        completed: row.try_get("round_finished")?,
    })
}

fn result_from_row(row: &SqliteRow) -> Result<SessionResult, DbError> {
    let session: String = row.try_get("session_type")?;
    let position: String = row.try_get("car_position")?;
    let time: String = row.try_get("result_time")?;
    Ok(SessionResult {
        round_number: row.try_get("round_number")?,
        session_type: session
            .parse()
            .map_err(|e: core_types::CoreError| DbError::CorruptRow(e.to_string()))?,
        car_number: row.try_get("car_number")?,
        paddock_number: row.try_get("paddock_number")?,
        position: FinishingPosition::parse(&position),
        time: ResultTime::from_stored(&time),
        points: row.try_get("car_points")?,
    })
}

fn ranking_from_row(row: &SqliteRow) -> Result<RankingEntry, DbError> {
    Ok(RankingEntry {
        round_number: row.try_get("round_number")?,
        entrant_key: row.try_get("entrant")?,
        position: row.try_get("position")?,
        points: row.try_get("points")?,
        title_contention: row.try_get("championship_chance")?,
    })
}

fn parse_round_type(raw: &str) -> Result<RoundType, DbError> {
    raw.parse()
        .map_err(|e: core_types::CoreError| DbError::CorruptRow(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_repository;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    async fn seeded() -> DbRepository {
        let repo = in_memory_repository().await.unwrap();

        for (paddock_number, name) in [(1, "Red Bull Racing Honda RBPT"), (2, "McLaren Mercedes")] {
            repo.save_constructor(&Constructor {
                full_name: name.to_string(),
                result_name: name.to_string(),
                short_name: name.split(' ').next().unwrap().to_string(),
                paddock_number,
            })
            .await
            .unwrap();
        }
        for (car_number, trigramme) in [(1, "VER"), (4, "NOR"), (81, "PIA")] {
            repo.save_driver(&Driver {
                name: trigramme.to_string(),
                trigramme: trigramme.to_string(),
                car_number,
                nationality: "N/A".to_string(),
            })
            .await
            .unwrap();
        }
        for (round_number, round_type) in [(1, RoundType::Standard), (2, RoundType::Sprint)] {
            repo.save_round(&Round {
                round_number,
                round_name: format!("Round {round_number}"),
                country: "Somewhere".to_string(),
                circuit: "Circuit".to_string(),
                round_date: NaiveDate::from_ymd_opt(2024, 3, round_number).unwrap(),
                round_type,
                completed: false,
            })
            .await
            .unwrap();
        }
        repo
    }

    fn result(
        round: RoundNumber,
        session: SessionType,
        car: CarNumber,
        paddock: PaddockNumber,
        place: u32,
        time: &str,
        points: Points,
    ) -> SessionResult {
        SessionResult {
            round_number: round,
            session_type: session,
            car_number: car,
            paddock_number: paddock,
            position: FinishingPosition::Classified(place),
            time: ResultTime::parse(time).unwrap(),
            points,
        }
    }

    fn entry(round: RoundNumber, key: EntrantKey, position: u32, points: Points) -> RankingEntry {
        RankingEntry {
            round_number: round,
            entrant_key: key,
            position,
            points,
            title_contention: true,
        }
    }

    #[tokio::test]
    async fn roster_saves_are_idempotent_and_resolvable() {
        let repo = seeded().await;

        let again = repo
            .save_driver(&Driver {
                name: "Max".to_string(),
                trigramme: "VER".to_string(),
                car_number: 1,
                nationality: "Dutch".to_string(),
            })
            .await
            .unwrap();
        assert!(!again);

        let driver = repo.get_driver_by_trigramme("NOR").await.unwrap().unwrap();
        assert_eq!(driver.car_number, 4);
        assert!(repo.get_driver_by_trigramme("XXX").await.unwrap().is_none());

        let constructor = repo
            .get_constructor_by_result_name("McLaren Mercedes")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(constructor.paddock_number, 2);

        assert_eq!(repo.get_all_car_numbers().await.unwrap(), vec![1, 4, 81]);
        assert_eq!(repo.get_all_paddock_numbers().await.unwrap(), vec![1, 2]);

        let trigrammes: Vec<_> = repo
            .get_all_drivers()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.trigramme)
            .collect();
        assert_eq!(trigrammes, vec!["VER", "NOR", "PIA"]);
        let short_names: Vec<_> = repo
            .get_all_constructors()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.short_name)
            .collect();
        assert_eq!(short_names, vec!["Red", "McLaren"]);
    }

    #[tokio::test]
    async fn taken_trigramme_or_result_name_is_an_error() {
        let repo = seeded().await;

        let clash = repo
            .save_driver(&Driver {
                name: "Someone Else".to_string(),
                trigramme: "NOR".to_string(),
                car_number: 44,
                nationality: "British".to_string(),
            })
            .await;
        assert!(matches!(
            clash,
            Err(DbError::DuplicateTrigramme { trigramme, car_number: 44 }) if trigramme == "NOR"
        ));
        assert!(repo.get_driver(44).await.unwrap().is_none());

        let renamed = repo
            .save_constructor(&Constructor {
                full_name: "Another Team".to_string(),
                result_name: "McLaren Mercedes".to_string(),
                short_name: "Another".to_string(),
                paddock_number: 9,
            })
            .await;
        assert!(matches!(
            renamed,
            Err(DbError::DuplicateResultName(name)) if name == "McLaren Mercedes"
        ));
        assert_eq!(repo.get_all_paddock_numbers().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn calendar_counts_races_and_sprints() {
        let repo = seeded().await;

        assert_eq!(
            repo.get_scheduled_counts().await.unwrap(),
            EventCounts {
                races: 2,
                sprints: 1,
            }
        );
        assert_eq!(repo.get_completed_counts().await.unwrap(), EventCounts::default());
        assert_eq!(repo.get_last_completed_round().await.unwrap(), None);

        let round = repo.get_round(2).await.unwrap().unwrap();
        assert_eq!(round.round_type, RoundType::Sprint);
        assert!(!round.completed);
    }

    #[tokio::test]
    async fn results_are_stored_and_read_back() {
        let repo = seeded().await;
        let mut dnf = result(1, SessionType::Race, 81, 2, 1, "DNF", 0);
        dnf.position = FinishingPosition::Unclassified("NC".to_string());

        repo.save_session_results(&[
            result(1, SessionType::Race, 1, 1, 1, "1:31:44.742", 25),
            result(1, SessionType::Race, 4, 2, 2, "1:31:51.100", 18),
            dnf.clone(),
        ])
        .await
        .unwrap();

        let stored = repo.get_results_for_round(1).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.contains(&dnf));
        assert_eq!(repo.count_results_for_session(1, SessionType::Race).await.unwrap(), 3);
        assert_eq!(repo.count_results_for_session(1, SessionType::Q1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_result_is_rejected_and_sheet_rolled_back() {
        let repo = seeded().await;
        repo.save_session_results(&[result(1, SessionType::Q1, 1, 1, 1, "1:29.421", 0)])
            .await
            .unwrap();

        let err = repo
            .save_session_results(&[
                result(1, SessionType::Q1, 4, 2, 2, "1:29.500", 0),
                result(1, SessionType::Q1, 1, 1, 3, "1:29.999", 0),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::DuplicateResult { round: 1, car_number: 1, session: SessionType::Q1 }
        ));
        assert_eq!(repo.count_results_for_round(1).await.unwrap(), 1);

        let kept = repo.get_results_for_round(1).await.unwrap();
        assert_eq!(kept[0].time, ResultTime::parse("1:29.421").unwrap());
    }

    #[tokio::test]
    async fn round_points_sum_every_session() {
        let repo = seeded().await;
        repo.save_session_results(&[
            result(2, SessionType::Sprint, 1, 1, 1, "30:00.000", 8),
            result(2, SessionType::Sprint, 4, 2, 2, "+1.000s", 7),
            result(2, SessionType::Sprint, 81, 2, 3, "+2.000s", 6),
            result(2, SessionType::Race, 4, 2, 1, "1:30:00.000", 25),
            result(2, SessionType::Race, 1, 1, 2, "+3.000s", 18),
        ])
        .await
        .unwrap();

        let drivers = repo.get_round_points(Championship::Drivers, 2).await.unwrap();
        assert_eq!(drivers, HashMap::from([(1, 26), (4, 32), (81, 6)]));

        let constructors = repo.get_round_points(Championship::Constructors, 2).await.unwrap();
        assert_eq!(constructors, HashMap::from([(1, 26), (2, 38)]));

        assert!(repo.get_round_points(Championship::Drivers, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completing_a_round_stores_both_tables_once() {
        let repo = seeded().await;
        let drivers = vec![entry(1, 1, 1, 25), entry(1, 4, 2, 18), entry(1, 81, 3, 0)];
        let constructors = vec![entry(1, 2, 1, 18), entry(1, 1, 2, 25)];

        repo.complete_round(1, &drivers, &constructors).await.unwrap();

        assert_eq!(repo.get_ranking(Championship::Drivers, 1).await.unwrap(), drivers);
        assert_eq!(
            repo.get_points_after_round(Championship::Constructors, 1, 1).await.unwrap(),
            Some(25)
        );
        assert_eq!(repo.get_points_after_round(Championship::Drivers, 44, 1).await.unwrap(), None);
        assert_eq!(
            repo.get_leader(Championship::Constructors, 1).await.unwrap().map(|e| e.entrant_key),
            Some(2)
        );
        assert_eq!(repo.get_last_completed_round().await.unwrap(), Some(1));
        assert_eq!(
            repo.get_completed_counts().await.unwrap(),
            EventCounts {
                races: 1,
                sprints: 0,
            }
        );

        let again = repo.complete_round(1, &drivers, &constructors).await;
        assert!(matches!(again, Err(DbError::RoundAlreadyCompleted(1))));
    }

    #[tokio::test]
    async fn duplicate_ranking_rolls_back_completion() {
        let repo = seeded().await;
        let drivers = vec![entry(2, 1, 1, 25), entry(2, 1, 2, 18)];

        let err = repo.complete_round(2, &drivers, &[]).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::DuplicateRanking { championship: Championship::Drivers, round: 2 }
        ));
        assert!(!repo.get_round(2).await.unwrap().unwrap().completed);
        assert!(repo.get_ranking(Championship::Drivers, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completing_an_unknown_round_is_not_found() {
        let repo = seeded().await;
        let result = repo.complete_round(9, &[], &[]).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
