//! # Gridstats Season Engine
//!
//! Drives each round through its lifecycle,
//! `Scheduled -> ResultsBeingIngested -> Completed`, and produces both
//! championship tables when a round completes.
//!
//! ## Architectural Principles
//!
//! - **Orchestrator:** The engine owns no data. It reads the calendar, the
//!   roster and the results from the `DbRepository`, lets the `standings`
//!   crate do the arithmetic and hands the tables back to the repository.
//! - **Forward Only:** A round completes once, after its predecessor, and only
//!   when its scoring sessions are stored. Completion and both tables are
//!   written in one transaction.

use crate::error::EngineError;
use configuration::ContentionSettings;
use core_types::{Championship, RankingEntry, Round, RoundNumber, RoundState, RoundType};
use database::{DbError, DbRepository};
use serde::Serialize;
use standings::{RemainingEvents, StandingsEngine};

pub mod error;

/// A calendar round together with where it stands in its lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct RoundStatus {
    pub round: Round,
    pub state: RoundState,
    pub stored_results: u64,
}

/// Both tables written when a round completed.
#[derive(Debug, Clone, Serialize)]
pub struct RoundCompletion {
    pub round_number: RoundNumber,
    pub remaining: RemainingEvents,
    pub drivers: Vec<RankingEntry>,
    pub constructors: Vec<RankingEntry>,
}

/// The central orchestrator of a season.
pub struct SeasonEngine {
    repo: DbRepository,
    drivers: StandingsEngine,
    constructors: StandingsEngine,
}

impl SeasonEngine {
    pub fn new(repo: DbRepository, contention: &ContentionSettings) -> Self {
        Self {
            repo,
            drivers: StandingsEngine::new(
                Championship::Drivers,
                contention.ceiling(Championship::Drivers),
            ),
            constructors: StandingsEngine::new(
                Championship::Constructors,
                contention.ceiling(Championship::Constructors),
            ),
        }
    }

    pub fn repository(&self) -> &DbRepository {
        &self.repo
    }

    /// The lifecycle state of one round.
    pub async fn round_state(&self, round_number: RoundNumber) -> Result<RoundState, EngineError> {
        let round = self.find_round(round_number).await?;
        let stored = self.repo.count_results_for_round(round_number).await?;
        Ok(RoundState::derive(round.completed, stored))
    }

    /// Every calendar round with its state, in round order.
    pub async fn season_status(&self) -> Result<Vec<RoundStatus>, EngineError> {
        let rounds = self.repo.get_all_rounds().await?;
        let mut statuses = Vec::with_capacity(rounds.len());
        for round in rounds {
            let stored_results = self.repo.count_results_for_round(round.round_number).await?;
            statuses.push(RoundStatus {
                state: RoundState::derive(round.completed, stored_results),
                round,
                stored_results,
            });
        }
        Ok(statuses)
    }

    /// Marks a round as completed and stores the drivers' and constructors'
    /// tables after it.
    ///
    /// Requires the round's Race results (and Sprint results on a sprint
    /// weekend) and, from round 2 on, a completed previous round. The round
    /// being completed counts as run when deciding title contention.
    pub async fn complete_round(
        &self,
        round_number: RoundNumber,
    ) -> Result<RoundCompletion, EngineError> {
        let round = self.find_round(round_number).await?;
        if round.completed {
            return Err(EngineError::RoundAlreadyCompleted(round_number));
        }

        for &session in round.round_type.scoring_sessions() {
            if self.repo.count_results_for_session(round_number, session).await? == 0 {
                return Err(EngineError::RoundNotReady {
                    round: round_number,
                    session,
                });
            }
        }

        if round_number > 1 {
            let previous = round_number - 1;
            let previous_completed = self
                .repo
                .get_round(previous)
                .await?
                .is_some_and(|round| round.completed);
            if !previous_completed {
                return Err(EngineError::PreviousRoundNotCompleted {
                    round: round_number,
                    previous,
                });
            }
        }

        let remaining = self.remaining_after(&round).await?;
        tracing::info!(
            round = round_number,
            races = remaining.races,
            sprints = remaining.sprints,
            "Events remaining after this round."
        );

        let drivers = self.rank(&self.drivers, round_number, remaining).await?;
        let constructors = self.rank(&self.constructors, round_number, remaining).await?;

        self.repo
            .complete_round(round_number, &drivers, &constructors)
            .await
            .map_err(|e| match e {
                DbError::RoundAlreadyCompleted(round) => EngineError::RoundAlreadyCompleted(round),
                other => EngineError::Database(other),
            })?;

        tracing::info!(
            round = round_number,
            name = %round.round_name,
            "Round completed and standings stored."
        );
        Ok(RoundCompletion {
            round_number,
            remaining,
            drivers,
            constructors,
        })
    }

    /// The stored table of one championship after a completed round.
    pub async fn standings(
        &self,
        championship: Championship,
        round_number: RoundNumber,
    ) -> Result<Vec<RankingEntry>, EngineError> {
        let round = self.find_round(round_number).await?;
        if !round.completed {
            return Err(EngineError::RoundNotCompleted(round_number));
        }
        Ok(self.repo.get_ranking(championship, round_number).await?)
    }

    async fn find_round(&self, round_number: RoundNumber) -> Result<Round, EngineError> {
        self.repo
            .get_round(round_number)
            .await?
            .ok_or(EngineError::UnknownRound(round_number))
    }

    /// Scheduled minus completed events, with `round` already counted as run.
    async fn remaining_after(&self, round: &Round) -> Result<RemainingEvents, EngineError> {
        let scheduled = self.repo.get_scheduled_counts().await?;
        let completed = self.repo.get_completed_counts().await?;
        let sprint = u32::from(round.round_type == RoundType::Sprint);

        Ok(RemainingEvents::from_calendar(
            scheduled.races,
            scheduled.sprints,
            completed.races + 1,
            completed.sprints + sprint,
        ))
    }

    async fn rank(
        &self,
        engine: &StandingsEngine,
        round_number: RoundNumber,
        remaining: RemainingEvents,
    ) -> Result<Vec<RankingEntry>, EngineError> {
        let championship = engine.championship();
        let entrants = self.repo.get_entrant_keys(championship).await?;
        let round_points = self.repo.get_round_points(championship, round_number).await?;
        let previous = if round_number > 1 {
            Some(self.repo.get_ranking(championship, round_number - 1).await?)
        } else {
            None
        };

        let entries = engine.rank_round(
            &entrants,
            round_number,
            |entrant, _| round_points.get(&entrant).copied().unwrap_or(0),
            previous.as_deref(),
            remaining,
        )?;
        Ok(entries)
    }
}
