use pickplace_core::RasterParams;
use serde::{Deserialize, Serialize};

/// Adaptive step size of one search stage, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepPolicy {
    pub initial: f64,
    /// Floor reached by repeated shrinking.
    pub min: f64,
    /// Cap reached by repeated growing.
    pub max: f64,
    /// Factor applied after an improving evaluation.
    pub shrink: f64,
    /// Factor applied after a non-improving iteration.
    pub grow: f64,
}

impl StepPolicy {
    /// Constant step.
    pub fn fixed(step: f64) -> Self {
        Self {
            initial: step,
            min: step,
            max: step,
            shrink: 1.0,
            grow: 1.0,
        }
    }

    #[inline]
    pub fn after_improvement(&self, step: f64) -> f64 {
        (step * self.shrink).clamp(self.min, self.max.max(self.min))
    }

    #[inline]
    pub fn after_stagnation(&self, step: f64) -> f64 {
        (step * self.grow).clamp(self.min, self.max.max(self.min))
    }
}

/// Termination of one search stage. Every stage has a hard iteration cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPolicy {
    pub max_iterations: usize,
    /// Stop after this many consecutive iterations without improvement.
    pub max_stagnant: Option<usize>,
}

/// Candidate angles a stage visits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Neighborhood {
    /// Walk from `start_deg` towards `end_deg` by the adaptive step. Angles
    /// are evaluated in their (-180, 180] form.
    Sweep { start_deg: f64, end_deg: f64 },
    /// Probe `best + step`, then `best - step`, taking the first improvement.
    /// Candidates farther than `window_deg` from the stage's starting angle
    /// are not evaluated.
    Bracket { window_deg: f64 },
    /// Evaluate every offset within `half_width_deg` of the starting angle,
    /// spaced by the initial step.
    Linear { half_width_deg: f64 },
}

/// One bounded local search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub neighborhood: Neighborhood,
    pub step: StepPolicy,
    pub stop: StopPolicy,
}

impl StageSpec {
    /// Full turn sweep: step 10, shrinks x0.7 to 5, grows x1.2 to 15.
    pub fn coarse() -> Self {
        Self {
            neighborhood: Neighborhood::Sweep {
                start_deg: 0.0,
                end_deg: 360.0,
            },
            step: StepPolicy {
                initial: 10.0,
                min: 5.0,
                max: 15.0,
                shrink: 0.7,
                grow: 1.2,
            },
            stop: StopPolicy {
                max_iterations: 100,
                max_stagnant: None,
            },
        }
    }

    /// +-15 deg bracket: step 3, shrinks x0.6 to 0.5, grows x1.3 to 5.
    pub fn local() -> Self {
        Self {
            neighborhood: Neighborhood::Bracket { window_deg: 15.0 },
            step: StepPolicy {
                initial: 3.0,
                min: 0.5,
                max: 5.0,
                shrink: 0.6,
                grow: 1.3,
            },
            stop: StopPolicy {
                max_iterations: 50,
                max_stagnant: Some(5),
            },
        }
    }

    /// +-2 deg at 0.5 deg resolution.
    pub fn fine() -> Self {
        Self {
            neighborhood: Neighborhood::Linear {
                half_width_deg: 2.0,
            },
            step: StepPolicy::fixed(0.5),
            stop: StopPolicy {
                max_iterations: 32,
                max_stagnant: None,
            },
        }
    }
}

/// Parameters of [`AlignmentRefiner`](super::AlignmentRefiner).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerParams {
    pub coarse: StageSpec,
    pub local: StageSpec,
    pub fine: StageSpec,
    /// Refinements with a magnitude at or below this are not applied.
    pub apply_threshold_deg: f64,
    /// Rasterization used by the default overlap scorer.
    pub raster: RasterParams,
}

impl Default for RefinerParams {
    fn default() -> Self {
        Self {
            coarse: StageSpec::coarse(),
            local: StageSpec::local(),
            fine: StageSpec::fine(),
            apply_threshold_deg: 0.1,
            raster: RasterParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn step_policy_respects_bounds() {
        let p = StageSpec::coarse().step;
        assert_abs_diff_eq!(p.after_improvement(10.0), 7.0, epsilon = 1e-12);
        assert_eq!(p.after_improvement(6.0), 5.0);
        assert_eq!(p.after_stagnation(14.0), 15.0);
        let f = StepPolicy::fixed(0.5);
        assert_eq!(f.after_improvement(0.5), 0.5);
        assert_eq!(f.after_stagnation(0.5), 0.5);
    }

    #[test]
    fn params_override_single_fields_from_json() {
        let p: RefinerParams =
            serde_json::from_str(r#"{ "apply_threshold_deg": 0.5 }"#).expect("params");
        assert_eq!(p.apply_threshold_deg, 0.5);
        assert_eq!(p.local, StageSpec::local());
        let json = serde_json::to_value(&p).expect("ser");
        assert_eq!(json["coarse"]["neighborhood"]["kind"], "sweep");
    }
}
