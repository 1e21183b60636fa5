//! Outbound notifications.
//!
//! Scoring, audio and camera live outside the generator. The manager gets
//! them injected at construction and only ever calls these traits.

use serde::{Serialize, Deserialize};

use crate::core::vec2::FixedVec2;
use crate::map::catalog::{AssetId, SharedEffect};

/// Receives score-relevant progress.
pub trait ScoreSink {
    /// The character reached `row` for the first time this run.
    fn row_reached(&mut self, row: i32);

    /// A coin was picked up; `total` is the running count for this run.
    fn coin_collected(&mut self, total: u32);
}

/// Ambient sound the current surroundings call for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmbientCue {
    /// Nothing nearby
    Quiet,
    /// A river lane is `distance` rows away
    River { distance: u32 },
    /// A train is about to cross the character's row
    TrainApproaching { row: i32 },
}

/// Receives ambient audio cues. Only changes are reported.
pub trait AudioCueSink {
    /// Switch the ambient cue.
    fn ambient(&mut self, cue: AmbientCue);
}

/// How the character died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Hit by a car or truck
    Vehicle,
    /// Hit by a train
    Train,
    /// Jumped into water
    Drowned,
    /// Carried off the edge by a log
    SweptAway,
    /// Taken by the eagle for idling or retreating
    Eagle,
}

/// Camera behaviour after a death.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusBehavior {
    /// Short shake, stay on the character
    Shake,
    /// Slow zoom onto the character
    ZoomIn,
    /// Follow whatever carried the character away
    Track,
}

impl DeathCause {
    /// Camera behaviour for this cause.
    pub fn focus_behavior(self) -> FocusBehavior {
        match self {
            DeathCause::Vehicle | DeathCause::Train => FocusBehavior::Shake,
            DeathCause::Drowned => FocusBehavior::ZoomIn,
            DeathCause::SweptAway | DeathCause::Eagle => FocusBehavior::Track,
        }
    }

    /// Shared effect played with this death, if any.
    pub fn effect(self) -> Option<SharedEffect> {
        match self {
            DeathCause::Drowned | DeathCause::SweptAway => Some(SharedEffect::WaterSplash),
            DeathCause::Eagle => Some(SharedEffect::Eagle),
            DeathCause::Vehicle | DeathCause::Train => None,
        }
    }
}

/// A camera focus request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    /// What killed the character
    pub cause: DeathCause,
    /// How the camera should react
    pub behavior: FocusBehavior,
    /// Where the character died
    pub position: FixedVec2,
    /// Effect asset to play there
    pub effect: Option<AssetId>,
}

/// Receives camera focus requests.
pub trait CameraSink {
    /// Focus the camera.
    fn focus(&mut self, request: FocusRequest);
}

/// Sink that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ScoreSink for NullSink {
    fn row_reached(&mut self, _row: i32) {}
    fn coin_collected(&mut self, _total: u32) {}
}

impl AudioCueSink for NullSink {
    fn ambient(&mut self, _cue: AmbientCue) {}
}

impl CameraSink for NullSink {
    fn focus(&mut self, _request: FocusRequest) {}
}

/// The sinks a manager reports to.
pub struct MapSinks {
    /// Score reporting
    pub score: Box<dyn ScoreSink>,
    /// Ambient audio
    pub audio: Box<dyn AudioCueSink>,
    /// Camera control
    pub camera: Box<dyn CameraSink>,
}

impl Default for MapSinks {
    fn default() -> Self {
        Self {
            score: Box::new(NullSink),
            audio: Box::new(NullSink),
            camera: Box::new(NullSink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_focus() {
        assert_eq!(DeathCause::Train.focus_behavior(), FocusBehavior::Shake);
        assert_eq!(DeathCause::Drowned.focus_behavior(), FocusBehavior::ZoomIn);
        assert_eq!(DeathCause::Eagle.effect(), Some(SharedEffect::Eagle));
        assert_eq!(DeathCause::Vehicle.effect(), None);
    }
}
