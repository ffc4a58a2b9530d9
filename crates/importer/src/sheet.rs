use crate::error::ImportError;
use crate::files::read_records;
use core_types::{
    CarNumber, FinishingPosition, PaddockNumber, Points, ResultTime, RoundNumber, SessionResult,
    SessionType,
};
use database::DbRepository;
use serde::Deserialize;
use standings::PointsTable;
use std::collections::HashMap;
use std::path::Path;

/// One row of a session result sheet: `Pos,No,Driver,Car,Time[,Points]`.
/// The `Driver` column is informational and not read.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "Pos")]
    pub position: String,
    #[serde(rename = "No")]
    pub car_number: CarNumber,
    /// The constructor's result name.
    #[serde(rename = "Car")]
    pub car: String,
    #[serde(rename = "Time")]
    pub time: String,
    /// Points as published, bonuses included. Absent on most sheets.
    #[serde(rename = "Points", default)]
    pub points: Option<Points>,
}

/// Turns the `Time` column of a sheet into stored times, one per row.
///
/// On Race and Sprint sheets the leader, the best classified finishing
/// position wherever it appears in the file, holds the winner's elapsed time
/// and every other numeric value is a gap to it, so the winner's time is added.
/// When the leader has no numeric time the gaps cannot be resolved and are
/// kept verbatim as markers. A value that cannot be parsed is logged and kept
/// verbatim as well.
pub fn resolve_times<'a>(
    session: SessionType,
    rows: impl IntoIterator<Item = (&'a FinishingPosition, &'a str)>,
) -> Vec<ResultTime> {
    let parsed: Vec<(Option<u32>, &str, ResultTime)> = rows
        .into_iter()
        .enumerate()
        .map(|(index, (position, raw))| {
            let time = ResultTime::parse(raw).unwrap_or_else(|e| {
                tracing::warn!(
                    session = %session,
                    row = index + 1,
                    error = %e,
                    "Storing time verbatim."
                );
                ResultTime::Marker(raw.trim().to_string())
            });
            (position.classified(), raw, time)
        })
        .collect();

    if !session.is_leader_relative() {
        return parsed.into_iter().map(|(_, _, time)| time).collect();
    }

    let leader_row = parsed
        .iter()
        .enumerate()
        .filter_map(|(index, (place, _, _))| place.map(|place| (place, index)))
        .min()
        .map(|(_, index)| index);
    let leader = leader_row.and_then(|index| parsed[index].2.seconds());

    parsed
        .into_iter()
        .enumerate()
        .map(|(index, (_, raw, time))| {
            if leader_row == Some(index) {
                return time;
            }
            match leader {
                Some(leader) => time.behind(leader),
                None if time.is_marker() => time,
                None => ResultTime::Marker(raw.trim().to_string()),
            }
        })
        .collect()
}

/// Points stored for one row. Scoring sessions prefer the sheet's own value.
pub fn row_points(
    table: &PointsTable,
    session: SessionType,
    position: &FinishingPosition,
    sheet_points: Option<Points>,
) -> Points {
    if !session.is_scoring() {
        return 0;
    }
    sheet_points.unwrap_or_else(|| table.points(position, session))
}

/// Ingests one session sheet for one round.
///
/// The sheet is all-or-nothing: an unknown car number or constructor name, or a
/// result already stored for the same round, car and session, rejects the
/// whole sheet and nothing is written. Returns the number of stored results.
pub async fn ingest_session(
    repo: &DbRepository,
    points_table: &PointsTable,
    round_number: RoundNumber,
    session: SessionType,
    path: &Path,
) -> Result<usize, ImportError> {
    let round = repo
        .get_round(round_number)
        .await?
        .ok_or(ImportError::UnknownRound(round_number))?;
    if round.completed {
        return Err(ImportError::RoundCompleted(round_number));
    }
    if !round.round_type.hosts(session) {
        return Err(ImportError::SessionNotInRound {
            round: round_number,
            session,
        });
    }

    let rows: Vec<SheetRow> = read_records(path)?;
    if rows.is_empty() {
        return Err(ImportError::EmptySheet(path.to_path_buf()));
    }

    let positions: Vec<FinishingPosition> = rows
        .iter()
        .map(|row| FinishingPosition::parse(&row.position))
        .collect();
    let times = resolve_times(
        session,
        positions.iter().zip(rows.iter().map(|row| row.time.as_str())),
    );
    let mut constructors: HashMap<String, PaddockNumber> = HashMap::new();
    let mut results = Vec::with_capacity(rows.len());

    for ((row, position), time) in rows.into_iter().zip(positions).zip(times) {
        if repo.get_driver(row.car_number).await?.is_none() {
            return Err(ImportError::UnknownEntrant(row.car_number));
        }
        let paddock_number = match constructors.get(&row.car) {
            Some(paddock_number) => *paddock_number,
            None => {
                let constructor = repo
                    .get_constructor_by_result_name(&row.car)
                    .await?
                    .ok_or_else(|| ImportError::UnknownConstructorName(row.car.clone()))?;
                constructors.insert(row.car.clone(), constructor.paddock_number);
                constructor.paddock_number
            }
        };

        let points = row_points(points_table, session, &position, row.points);
        tracing::info!(
            round = round_number,
            session = %session,
            car_number = row.car_number,
            position = %position,
            time = %time,
            points,
            "Result read."
        );

        results.push(SessionResult {
            round_number,
            session_type: session,
            car_number: row.car_number,
            paddock_number,
            position,
            time,
            points,
        });
    }

    repo.save_session_results(&results).await?;
    tracing::info!(
        round = round_number,
        session = %session,
        results = results.len(),
        file = %path.display(),
        "Session results stored."
    );
    Ok(results.len())
}
