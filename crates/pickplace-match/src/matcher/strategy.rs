use pickplace_core::{Contour, WorkpieceTemplate};
use serde::{Deserialize, Serialize};

/// Outcome class of comparing one template with one detected contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Same,
    Different,
    Uncertain,
}

/// Verdict plus the strategy's score for it.
///
/// The scale of `confidence` belongs to the strategy: area-ratio matching
/// reports a similarity in 0..=100, classifiers usually a probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub confidence: f64,
}

impl Verdict {
    pub fn same(confidence: f64) -> Self {
        Self {
            kind: VerdictKind::Same,
            confidence,
        }
    }

    pub fn different(confidence: f64) -> Self {
        Self {
            kind: VerdictKind::Different,
            confidence,
        }
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        self.kind == VerdictKind::Same
    }

    /// Whether `self` should replace `current` as the best verdict so far.
    ///
    /// A matching verdict always beats a non-matching one, whatever the
    /// confidences; within the same class the higher confidence wins and the
    /// earlier candidate is kept on ties.
    pub fn beats(&self, current: Option<&Verdict>) -> bool {
        match current {
            None => true,
            Some(cur) => match (self.is_match(), cur.is_match()) {
                (true, false) => true,
                (false, true) => false,
                _ => self.confidence > cur.confidence,
            },
        }
    }
}

/// Capability used by [`ContourMatcher`](super::ContourMatcher) to compare a
/// template against a detected contour.
pub trait MatchStrategy {
    fn evaluate(&self, template: &WorkpieceTemplate, contour: &Contour) -> Verdict;
}

impl<S: MatchStrategy + ?Sized> MatchStrategy for &S {
    fn evaluate(&self, template: &WorkpieceTemplate, contour: &Contour) -> Verdict {
        (**self).evaluate(template, contour)
    }
}

/// `min(a, b) / max(a, b) * 100`, clipped to [0, 100].
///
/// Zero or negative areas score 0.
pub fn area_similarity(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 || !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    (a.min(b) / a.max(b) * 100.0).clamp(0.0, 100.0)
}

/// Default strategy: a pair is the same part when the area similarity
/// strictly exceeds `threshold`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaRatioStrategy {
    pub threshold: f64,
}

impl AreaRatioStrategy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for AreaRatioStrategy {
    fn default() -> Self {
        Self::new(80.0)
    }
}

impl MatchStrategy for AreaRatioStrategy {
    fn evaluate(&self, template: &WorkpieceTemplate, contour: &Contour) -> Verdict {
        let score = area_similarity(template.main_contour.area(), contour.area());
        if score > self.threshold {
            Verdict::same(score)
        } else {
            Verdict::different(score)
        }
    }
}

/// Trained shape comparison model. Implementations live outside this crate.
pub trait ShapeClassifier {
    fn classify(&self, template: &Contour, candidate: &Contour) -> Verdict;
}

/// Strategy delegating the decision to a [`ShapeClassifier`].
///
/// Only `Same` verdicts match, so a lower-confidence `Same` always wins over a
/// higher-confidence `Uncertain`.
#[derive(Clone, Debug)]
pub struct ClassifierStrategy<C> {
    classifier: C,
}

impl<C: ShapeClassifier> ClassifierStrategy<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    #[inline]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

impl<C: ShapeClassifier> MatchStrategy for ClassifierStrategy<C> {
    fn evaluate(&self, template: &WorkpieceTemplate, contour: &Contour) -> Verdict {
        self.classifier.classify(&template.main_contour, contour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equal_areas_score_100() {
        for a in [1e-3, 1.0, 1000.0, 7.5e6] {
            assert_eq!(area_similarity(a, a), 100.0);
        }
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        assert_abs_diff_eq!(area_similarity(1000.0, 1005.0), 99.502487, epsilon = 1e-5);
        assert_eq!(area_similarity(1000.0, 1005.0), area_similarity(1005.0, 1000.0));
        assert_eq!(area_similarity(0.0, 10.0), 0.0);
        assert_eq!(area_similarity(-5.0, 10.0), 0.0);
        assert_eq!(area_similarity(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn same_verdict_beats_stronger_uncertain() {
        let same = Verdict::same(0.55);
        let unsure = Verdict {
            kind: VerdictKind::Uncertain,
            confidence: 0.99,
        };
        assert!(same.beats(Some(&unsure)));
        assert!(!unsure.beats(Some(&same)));
        assert!(!Verdict::same(0.5).beats(Some(&Verdict::same(0.5))));
        assert!(Verdict::different(0.0).beats(None));
    }
}
