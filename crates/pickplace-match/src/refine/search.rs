use pickplace_core::{angular_distance_deg, normalize_angle_deg};
use serde::{Deserialize, Serialize};

use super::{AlignmentObserver, Neighborhood, Stage, StageSpec};

/// Best angle found by one stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub angle_deg: f64,
    pub score: f64,
    pub evaluations: usize,
}

struct Search<'o, F> {
    stage: Stage,
    evaluate: F,
    observer: &'o mut dyn AlignmentObserver,
    best_angle: f64,
    best_score: f64,
    evaluations: usize,
}

impl<F, E> Search<'_, F>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    /// Score `angle`; returns whether it replaced the best.
    fn probe(&mut self, angle: f64) -> Result<bool, E> {
        let angle = normalize_angle_deg(angle);
        let score = (self.evaluate)(angle)?;
        self.evaluations += 1;
        self.observer.on_evaluation(self.stage, angle, score);
        if score > self.best_score {
            self.best_angle = angle;
            self.best_score = score;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Run one bounded local search stage starting from a scored anchor.
///
/// The best angle only changes on a strict score improvement, so the
/// returned score is never below `anchor_score`. A non-positive or
/// non-finite step ends the stage without evaluating anything.
pub fn run_stage<F, E>(
    stage: Stage,
    spec: &StageSpec,
    anchor_deg: f64,
    anchor_score: f64,
    evaluate: F,
    observer: &mut dyn AlignmentObserver,
) -> Result<StageOutcome, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let mut s = Search {
        stage,
        evaluate,
        observer,
        best_angle: normalize_angle_deg(anchor_deg),
        best_score: anchor_score,
        evaluations: 0,
    };
    let anchor = s.best_angle;
    let mut step = spec.step.initial;
    let stagnation_limit = spec.stop.max_stagnant.unwrap_or(usize::MAX);
    let usable = |step: f64| step.is_finite() && step > 0.0;

    match spec.neighborhood {
        Neighborhood::Sweep { start_deg, end_deg } => {
            let mut angle = start_deg;
            let mut stagnant = 0;
            let mut iteration = 0;
            while usable(step)
                && angle < end_deg
                && iteration < spec.stop.max_iterations
                && stagnant < stagnation_limit
            {
                iteration += 1;
                if s.probe(angle)? {
                    step = spec.step.after_improvement(step);
                    stagnant = 0;
                } else {
                    step = spec.step.after_stagnation(step);
                    stagnant += 1;
                }
                angle += step;
            }
        }
        Neighborhood::Bracket { window_deg } => {
            let mut stagnant = 0;
            let mut iteration = 0;
            while usable(step) && iteration < spec.stop.max_iterations && stagnant < stagnation_limit
            {
                iteration += 1;
                let mut improved = false;
                for direction in [1.0, -1.0] {
                    let candidate = normalize_angle_deg(s.best_angle + direction * step);
                    if angular_distance_deg(candidate, anchor) > window_deg {
                        continue;
                    }
                    if s.probe(candidate)? {
                        improved = true;
                        break;
                    }
                }
                if improved {
                    step = spec.step.after_improvement(step);
                    stagnant = 0;
                } else {
                    step = spec.step.after_stagnation(step);
                    stagnant += 1;
                }
            }
        }
        Neighborhood::Linear { half_width_deg } => {
            if usable(step) && half_width_deg.is_finite() {
                let n = (half_width_deg / step).floor() as i64;
                // nearest offsets first so the cap trims both ends evenly
                let offsets = (1..=n).flat_map(|d| [-d, d]);
                for k in offsets.take(spec.stop.max_iterations) {
                    s.probe(anchor + k as f64 * step)?;
                }
            }
        }
    }

    s.observer.on_stage_complete(stage, s.best_angle, s.best_score);
    Ok(StageOutcome {
        angle_deg: s.best_angle,
        score: s.best_score,
        evaluations: s.evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::refine::{StepPolicy, StopPolicy};
    use std::convert::Infallible;

    /// Single smooth peak at `peak` degrees.
    fn bump(peak: f64) -> impl FnMut(f64) -> Result<f64, Infallible> {
        move |a| Ok(1.0 / (1.0 + angular_distance_deg(a, peak).powi(2) / 100.0))
    }

    #[test]
    fn coarse_sweep_lands_near_peak() {
        let mut seen: Vec<(Stage, f64, f64)> = Vec::new();
        let out = run_stage(Stage::Coarse, &StageSpec::coarse(), 0.0, 0.0, bump(-123.0), &mut seen)
            .expect("infallible");
        assert!(angular_distance_deg(out.angle_deg, -123.0) <= 7.5, "{out:?}");
        assert!(out.evaluations <= 100);
        assert_eq!(seen.len(), out.evaluations);
        assert!(seen.iter().all(|(st, a, _)| *st == Stage::Coarse && *a > -180.0 && *a <= 180.0));
    }

    #[test]
    fn bracket_stays_inside_window() {
        // the peak lies outside the +-15 deg window
        let mut seen: Vec<(Stage, f64, f64)> = Vec::new();
        let out = run_stage(Stage::Local, &StageSpec::local(), 10.0, 0.0, bump(60.0), &mut seen)
            .expect("infallible");
        assert!(seen.iter().all(|(_, a, _)| angular_distance_deg(*a, 10.0) <= 15.0 + 1e-9));
        assert!(out.angle_deg > 10.0 && out.angle_deg <= 25.0 + 1e-9);
    }

    #[test]
    fn bracket_converges_on_nearby_peak() {
        let mut score = bump(4.2);
        let anchor_score = score(0.0).expect("infallible");
        let out = run_stage(Stage::Local, &StageSpec::local(), 0.0, anchor_score, score, &mut ())
            .expect("infallible");
        assert!(angular_distance_deg(out.angle_deg, 4.2) < 1.0, "{out:?}");
    }

    #[test]
    fn linear_sweep_covers_fixed_grid() {
        let mut seen: Vec<(Stage, f64, f64)> = Vec::new();
        let out = run_stage(Stage::Fine, &StageSpec::fine(), 179.0, 0.0, bump(-179.5), &mut seen)
            .expect("infallible");
        // 8 offsets around the anchor, wrapping through +-180
        assert_eq!(out.evaluations, 8);
        assert_abs_diff_eq!(out.angle_deg, -179.5, epsilon = 1e-9);
    }

    #[test]
    fn capped_linear_sweep_stays_balanced() {
        let spec = StageSpec {
            step: StepPolicy::fixed(0.01),
            stop: StopPolicy {
                max_iterations: 6,
                max_stagnant: None,
            },
            ..StageSpec::fine()
        };
        let mut seen: Vec<(Stage, f64, f64)> = Vec::new();
        let out = run_stage(Stage::Fine, &spec, 0.0, 0.0, bump(1.0), &mut seen)
            .expect("infallible");
        assert_eq!(out.evaluations, 6);
        let below = seen.iter().filter(|(_, a, _)| *a < 0.0).count();
        let above = seen.iter().filter(|(_, a, _)| *a > 0.0).count();
        assert_eq!((below, above), (3, 3));
        assert!(seen.iter().all(|(_, a, _)| a.abs() <= 0.03 + 1e-9));
        assert_abs_diff_eq!(out.angle_deg, 0.03, epsilon = 1e-9);
    }

    #[test]
    fn never_returns_worse_than_anchor() {
        let out = run_stage(Stage::Local, &StageSpec::local(), 0.0, 2.0, bump(5.0), &mut ())
            .expect("infallible");
        assert_eq!(out.angle_deg, 0.0);
        assert_eq!(out.score, 2.0);
    }

    #[test]
    fn evaluation_errors_propagate() {
        let err = run_stage(Stage::Coarse, &StageSpec::coarse(), 0.0, 0.0, |_| Err("boom"), &mut ())
            .expect_err("must fail");
        assert_eq!(err, "boom");
    }
}
