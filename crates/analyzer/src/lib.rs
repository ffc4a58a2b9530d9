//! # Gridstats Head-to-Head Analyzer
//!
//! Compares two drivers over the qualifying segments they both contested.
//!
//! ## Public API
//!
//! - `compare_segments`: the pure comparison over two drivers' results.
//! - `Analyzer`: fetches both drivers' results and runs the comparison.
//! - `AnalyzerError`: the specific error types that can be returned from this crate.

use crate::error::AnalyzerError;
use core_types::{
    Driver, QualifyingFormat, ResultTime, RoundNumber, SessionResult, SessionType,
};
use database::DbRepository;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub mod error;

/// How two drivers compare in one qualifying segment over the season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentComparison {
    pub session: SessionType,
    pub driver1_ahead: u32,
    pub driver2_ahead: u32,
    /// Rounds where both drivers set a time and were classified.
    pub compared: u32,
    /// Mean of `driver2_time - driver1_time` in seconds. Positive when driver 1
    /// was faster on average. `None` when nothing could be compared.
    pub mean_delta: Option<Decimal>,
}

impl SegmentComparison {
    fn new(session: SessionType) -> Self {
        Self {
            session,
            driver1_ahead: 0,
            driver2_ahead: 0,
            compared: 0,
            mean_delta: None,
        }
    }
}

/// The full comparison of two drivers.
#[derive(Debug, Clone, Serialize)]
pub struct HeadToHead {
    pub driver1: Driver,
    pub driver2: Driver,
    pub format: QualifyingFormat,
    pub segments: Vec<SegmentComparison>,
}

/// Compares two drivers' results segment by segment.
///
/// Results are paired on equal round number and session type. A pair is
/// skipped when either driver has no numeric time or was not classified. In
/// every other pair the better position earns an ahead count and the time
/// difference enters the mean.
pub fn compare_segments(
    driver1: &[SessionResult],
    driver2: &[SessionResult],
    format: QualifyingFormat,
) -> Vec<SegmentComparison> {
    let rivals: HashMap<(RoundNumber, SessionType), &SessionResult> =
        driver2.iter().map(|result| (result.slot(), result)).collect();

    format
        .segments()
        .into_iter()
        .map(|session| {
            let mut segment = SegmentComparison::new(session);
            let mut total_delta = Decimal::ZERO;

            for first in driver1.iter().filter(|r| r.session_type == session) {
                let Some(second) = rivals.get(&first.slot()) else {
                    continue;
                };
                let (Some(place1), Some(place2)) =
                    (first.position.classified(), second.position.classified())
                else {
                    continue;
                };
                let (ResultTime::Elapsed(time1), ResultTime::Elapsed(time2)) =
                    (&first.time, &second.time)
                else {
                    continue;
                };

                segment.compared += 1;
                total_delta += *time2 - *time1;
                if place1 < place2 {
                    segment.driver1_ahead += 1;
                } else if place2 < place1 {
                    segment.driver2_ahead += 1;
                }
            }

            if segment.compared > 0 {
                segment.mean_delta = Some(total_delta / Decimal::from(segment.compared));
            }
            segment
        })
        .collect()
}

/// The head-to-head analysis engine.
pub struct Analyzer {
    format: QualifyingFormat,
}

impl Analyzer {
    pub fn new(format: QualifyingFormat) -> Self {
        Self { format }
    }

    /// Fetches both drivers' qualifying results and compares them.
    pub async fn run(
        &self,
        db_repo: &DbRepository,
        trigramme1: &str,
        trigramme2: &str,
    ) -> Result<HeadToHead, AnalyzerError> {
        // 1. Resolve
        let driver1 = find_driver(db_repo, trigramme1).await?;
        let driver2 = find_driver(db_repo, trigramme2).await?;

        // 2. Fetch
        let sessions = self.format.segments();
        let results1 = db_repo.get_results_by_driver(driver1.car_number, &sessions).await?;
        let results2 = db_repo.get_results_by_driver(driver2.car_number, &sessions).await?;

        // 3. Compare
        let segments = compare_segments(&results1, &results2, self.format);
        for segment in &segments {
            tracing::info!(
                driver1 = %driver1.trigramme,
                driver2 = %driver2.trigramme,
                session = %segment.session,
                driver1_ahead = segment.driver1_ahead,
                driver2_ahead = segment.driver2_ahead,
                compared = segment.compared,
                "Qualifying segment compared."
            );
        }

        Ok(HeadToHead {
            driver1,
            driver2,
            format: self.format,
            segments,
        })
    }
}

async fn find_driver(db_repo: &DbRepository, trigramme: &str) -> Result<Driver, AnalyzerError> {
    let trigramme = trigramme.trim().to_ascii_uppercase();
    db_repo
        .get_driver_by_trigramme(&trigramme)
        .await?
        .ok_or(AnalyzerError::UnknownDriver(trigramme))
}
