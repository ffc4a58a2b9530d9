use configuration::ScoringSettings;
use core_types::{FinishingPosition, Points, SessionType};

/// Maps a finishing position to championship points for each session type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsTable {
    race: Vec<Points>,
    sprint: Vec<Points>,
}

impl PointsTable {
    /// `race` and `sprint` list the points for P1, P2, ... in order.
    pub fn new(race: Vec<Points>, sprint: Vec<Points>) -> Self {
        Self { race, sprint }
    }

    pub fn from_settings(settings: &ScoringSettings) -> Self {
        Self::new(settings.race_points.clone(), settings.sprint_points.clone())
    }

    /// Points for a finish. Unclassified finishes and non-scoring sessions earn 0.
    pub fn points(&self, position: &FinishingPosition, session: SessionType) -> Points {
        position
            .classified()
            .map_or(0, |place| self.points_for_place(place, session))
    }

    /// Points for a classified place. Places past the end of the table earn 0.
    pub fn points_for_place(&self, place: u32, session: SessionType) -> Points {
        let table = match session {
            SessionType::Race => &self.race,
            SessionType::Sprint => &self.sprint,
            _ => return 0,
        };
        let Some(index) = place.checked_sub(1) else {
            return 0;
        };
        table.get(index as usize).copied().unwrap_or(0)
    }
}

impl Default for PointsTable {
    fn default() -> Self {
        Self::from_settings(&ScoringSettings::default())
    }
}
