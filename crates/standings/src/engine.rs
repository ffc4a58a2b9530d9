use crate::error::StandingsError;
use configuration::ContentionCeiling;
use core_types::{Championship, EntrantKey, Points, RankingEntry, RoundNumber};
use serde::Serialize;
use std::collections::HashMap;

/// An entrant's place in a table before contention is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub entrant_key: EntrantKey,
    pub position: u32,
    pub points: Points,
}

/// Scoring events still to be run in the season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemainingEvents {
    pub races: u32,
    pub sprints: u32,
}

impl RemainingEvents {
    /// Scheduled minus completed, per event type.
    pub fn from_calendar(
        scheduled_races: u32,
        scheduled_sprints: u32,
        completed_races: u32,
        completed_sprints: u32,
    ) -> Self {
        Self {
            races: scheduled_races.saturating_sub(completed_races),
            sprints: scheduled_sprints.saturating_sub(completed_sprints),
        }
    }

    /// The most one entrant can still add to their tally.
    pub fn available_points(&self, ceiling: ContentionCeiling) -> u64 {
        u64::from(self.races) * u64::from(ceiling.max_race_points)
            + u64::from(self.sprints) * u64::from(ceiling.max_sprint_points)
    }
}

/// A stateless calculator for one championship's tables.
#[derive(Debug, Clone)]
pub struct StandingsEngine {
    championship: Championship,
    ceiling: ContentionCeiling,
}

impl StandingsEngine {
    pub fn new(championship: Championship, ceiling: ContentionCeiling) -> Self {
        Self {
            championship,
            ceiling,
        }
    }

    pub fn championship(&self) -> Championship {
        self.championship
    }

    /// Orders every entrant by cumulative points after `round`.
    ///
    /// # Arguments
    ///
    /// * `entrants` - Every key on the roster, in any order.
    /// * `round` - The round that has just completed.
    /// * `session_points` - Points an entrant scored across all sessions of a round.
    /// * `previous` - The stored table of `round - 1`. Ignored for round 1.
    ///
    /// Equal points keep key-ascending order.
    pub fn compute_ranking<F>(
        &self,
        entrants: &[EntrantKey],
        round: RoundNumber,
        session_points: F,
        previous: Option<&[RankingEntry]>,
    ) -> Result<Vec<Standing>, StandingsError>
    where
        F: Fn(EntrantKey, RoundNumber) -> Points,
    {
        if round == 0 {
            return Err(StandingsError::InvalidRound);
        }

        let previous_points: HashMap<EntrantKey, Points> = previous
            .unwrap_or_default()
            .iter()
            .map(|entry| (entry.entrant_key, entry.points))
            .collect();

        let mut keys = entrants.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mut standings = Vec::with_capacity(keys.len());
        for entrant in keys {
            let carried = if round == 1 {
                0
            } else {
                *previous_points
                    .get(&entrant)
                    .ok_or(StandingsError::MissingPriorRanking {
                        championship: self.championship,
                        round: round - 1,
                        entrant,
                    })?
            };
            let points = carried + session_points(entrant, round);
            tracing::info!(
                championship = %self.championship,
                entrant,
                round,
                points,
                "Cumulative points computed."
            );
            standings.push(Standing {
                entrant_key: entrant,
                position: 0,
                points,
            });
        }

        Ok(assign_positions(standings))
    }

    /// Whether an entrant can still overtake the leader.
    pub fn title_contention(
        &self,
        standing: &Standing,
        round: RoundNumber,
        remaining: RemainingEvents,
        leader_points: Points,
    ) -> bool {
        title_contention(
            standing.position,
            standing.points,
            round,
            remaining,
            leader_points,
            self.ceiling,
        )
    }

    /// Builds the complete table for `round`, ready to be stored.
    pub fn rank_round<F>(
        &self,
        entrants: &[EntrantKey],
        round: RoundNumber,
        session_points: F,
        previous: Option<&[RankingEntry]>,
        remaining: RemainingEvents,
    ) -> Result<Vec<RankingEntry>, StandingsError>
    where
        F: Fn(EntrantKey, RoundNumber) -> Points,
    {
        let standings = self.compute_ranking(entrants, round, session_points, previous)?;
        let leader_points = standings.first().map_or(0, |leader| leader.points);

        let entries = standings
            .iter()
            .map(|standing| {
                let contention = self.title_contention(standing, round, remaining, leader_points);
                tracing::info!(
                    championship = %self.championship,
                    entrant = standing.entrant_key,
                    position = standing.position,
                    points = standing.points,
                    round,
                    contention,
                    "Ranking entry prepared."
                );
                RankingEntry {
                    round_number: round,
                    entrant_key: standing.entrant_key,
                    position: standing.position,
                    points: standing.points,
                    title_contention: contention,
                }
            })
            .collect();

        Ok(entries)
    }
}

/// Sorts by points descending, keeping the incoming order among equals, and
/// numbers the result from 1.
pub fn assign_positions(mut standings: Vec<Standing>) -> Vec<Standing> {
    standings.sort_by(|a, b| b.points.cmp(&a.points));
    for (index, standing) in standings.iter_mut().enumerate() {
        standing.position = index as u32 + 1;
    }
    standings
}

/// Nobody is out at round 1 and the leader is never out. Otherwise an entrant
/// stays in contention only if the points still available would take them
/// strictly past the leader; drawing level is not enough.
pub fn title_contention(
    position: u32,
    points: Points,
    round: RoundNumber,
    remaining: RemainingEvents,
    leader_points: Points,
    ceiling: ContentionCeiling,
) -> bool {
    if round == 1 || position == 1 {
        return true;
    }
    u64::from(points) + remaining.available_points(ceiling) > u64::from(leader_points)
}
