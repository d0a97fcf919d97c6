use serde::{Deserialize, Serialize};

/// Refinement stage an evaluation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Baseline,
    Coarse,
    Local,
    Fine,
}

/// Receives every overlap evaluation made by the refiner.
///
/// Used for diagnostics and visualization only; the refiner never reads
/// anything back from it.
pub trait AlignmentObserver {
    fn on_evaluation(&mut self, stage: Stage, angle_deg: f64, score: f64);

    fn on_stage_complete(&mut self, _stage: Stage, _best_angle_deg: f64, _best_score: f64) {}
}

impl AlignmentObserver for Vec<(Stage, f64, f64)> {
    fn on_evaluation(&mut self, stage: Stage, angle_deg: f64, score: f64) {
        self.push((stage, angle_deg, score));
    }
}

/// Discards everything.
impl AlignmentObserver for () {
    fn on_evaluation(&mut self, _stage: Stage, _angle_deg: f64, _score: f64) {}
}
