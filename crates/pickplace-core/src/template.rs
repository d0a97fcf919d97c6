//! Workpiece template model.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Contour;

/// Identifier of a gripper variant mounted on the robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GripperId(pub u32);

impl fmt::Display for GripperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gripper#{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PickupPointRepr {
    Text(String),
    Pair([f64; 2]),
}

/// Pickup location override in template coordinates.
///
/// Accepted from JSON either as `"x,y"` text or as an `[x, y]` pair, always
/// written back as a pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "[f64; 2]")]
pub struct PickupPoint(pub Point2<f64>);

impl PickupPoint {
    fn from_repr(repr: PickupPointRepr) -> Result<Self, String> {
        let [x, y] = match repr {
            PickupPointRepr::Pair(xy) => xy,
            PickupPointRepr::Text(text) => {
                let mut parts = text.split(',').map(str::trim);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(x), Some(y), None) => [
                        x.parse::<f64>()
                            .map_err(|e| format!("pickup point x {x:?}: {e}"))?,
                        y.parse::<f64>()
                            .map_err(|e| format!("pickup point y {y:?}: {e}"))?,
                    ],
                    _ => return Err(format!("pickup point {text:?} is not \"x,y\"")),
                }
            }
        };
        if !x.is_finite() || !y.is_finite() {
            return Err("pickup point must be finite".to_string());
        }
        Ok(Self(Point2::new(x, y)))
    }
}

impl<'de> Deserialize<'de> for PickupPoint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PickupPointRepr::deserialize(deserializer)?;
        Self::from_repr(repr).map_err(serde::de::Error::custom)
    }
}

impl From<PickupPoint> for [f64; 2] {
    fn from(p: PickupPoint) -> Self {
        [p.0.x, p.0.y]
    }
}

/// One contour of a pattern group with its opaque per-path settings
/// (tool speed, spacing and so on; never interpreted here).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub contour: Contour,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// A known part: reference contour, attached pattern groups and handling data.
///
/// Templates are read-only while a frame is being matched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkpieceTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Reference outline used for matching and alignment.
    pub main_contour: Contour,
    /// Named layers such as `"outline"` or `"fill"`.
    #[serde(default)]
    pub pattern_groups: BTreeMap<String, Vec<PatternEntry>>,
    #[serde(default)]
    pub pickup_point: Option<PickupPoint>,
    pub gripper: GripperId,
    /// Nominal part thickness in mm.
    #[serde(default)]
    pub height_mm: f64,
}

impl WorkpieceTemplate {
    pub fn new(id: impl Into<String>, main_contour: Contour, gripper: GripperId) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            main_contour,
            pattern_groups: BTreeMap::new(),
            pickup_point: None,
            gripper,
            height_mm: 0.0,
        }
    }

    pub fn with_pattern(mut self, group: impl Into<String>, entry: PatternEntry) -> Self {
        self.pattern_groups.entry(group.into()).or_default().push(entry);
        self
    }

    pub fn with_pickup_point(mut self, p: Point2<f64>) -> Self {
        self.pickup_point = Some(PickupPoint(p));
        self
    }

    pub fn with_height(mut self, height_mm: f64) -> Self {
        self.height_mm = height_mm;
        self
    }

    #[inline]
    pub fn pickup_point(&self) -> Option<Point2<f64>> {
        self.pickup_point.map(|p| p.0)
    }

    pub fn pattern_contour_count(&self) -> usize {
        self.pattern_groups.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_point_accepts_text_and_pair() {
        let a: PickupPoint = serde_json::from_str("\"12.5, -3\"").expect("text");
        let b: PickupPoint = serde_json::from_str("[12.5, -3.0]").expect("pair");
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).expect("ser"), "[12.5,-3.0]");
    }

    #[test]
    fn pickup_point_rejects_garbage() {
        assert!(serde_json::from_str::<PickupPoint>("\"12.5\"").is_err());
        assert!(serde_json::from_str::<PickupPoint>("\"a,b\"").is_err());
        assert!(serde_json::from_str::<PickupPoint>("\"1,2,3\"").is_err());
    }

    #[test]
    fn template_from_minimal_json() {
        let json = r#"{
            "id": "bracket",
            "main_contour": [[0, 0], [10, 0], [10, 5]],
            "gripper": 1,
            "pattern_groups": {
                "fill": [{ "contour": [[1, 1], [2, 1], [2, 2]], "settings": { "speed": 40 } }]
            },
            "pickup_point": "5,2"
        }"#;
        let t: WorkpieceTemplate = serde_json::from_str(json).expect("template");
        assert_eq!(t.gripper, GripperId(1));
        assert_eq!(t.main_contour.len(), 3);
        assert_eq!(t.pattern_contour_count(), 1);
        assert_eq!(t.pickup_point(), Some(Point2::new(5.0, 2.0)));
        assert_eq!(t.height_mm, 0.0);
        assert_eq!(t.pattern_groups["fill"][0].settings["speed"], 40);
    }
}
