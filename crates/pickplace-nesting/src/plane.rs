use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::NestingError;

/// Bounds and spacing of the drop-off plane, in robot millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Gap between neighbouring parts and between rows.
    pub spacing: f64,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            x_min: -450.0,
            x_max: 350.0,
            y_min: 300.0,
            y_max: 700.0,
            spacing: 30.0,
        }
    }
}

impl PlaneConfig {
    pub fn validate(&self) -> Result<(), NestingError> {
        let all_finite = [self.x_min, self.x_max, self.y_min, self.y_max, self.spacing]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(NestingError::InvalidPlane {
                reason: "non-finite bound",
            });
        }
        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(NestingError::InvalidPlane {
                reason: "max must exceed min",
            });
        }
        if self.spacing < 0.0 {
            return Err(NestingError::InvalidPlane {
                reason: "negative spacing",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Mutable cursor of a nesting session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneState {
    /// Distance from `x_min` to the next free position in the current row.
    pub x_offset: f64,
    /// Distance from `y_max` to the top of the current row.
    pub y_offset: f64,
    pub tallest_in_row: f64,
    /// Zero-based index of the current row.
    pub row: usize,
    pub placed: usize,
    pub is_full: bool,
}

/// Where a part goes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementSlot {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub row: usize,
}

impl PlacementSlot {
    /// `(min, max)` corners of the slot's bounding box.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let hw = 0.5 * self.width;
        let hh = 0.5 * self.height;
        (
            Point2::new(self.center.x - hw, self.center.y - hh),
            Point2::new(self.center.x + hw, self.center.y + hh),
        )
    }
}

/// Greedy shelf packer over a bounded plane.
///
/// Single-writer session state: create (or [`reset`](Self::reset)) at the
/// start of a session and feed parts one by one with [`place`](Self::place).
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPlane {
    config: PlaneConfig,
    state: PlaneState,
}

impl PlacementPlane {
    pub fn new(config: PlaneConfig) -> Result<Self, NestingError> {
        config.validate()?;
        Ok(Self {
            config,
            state: PlaneState::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &PlaneConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &PlaneState {
        &self.state
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.state.is_full
    }

    /// Start a new session on the same plane.
    pub fn reset(&mut self) {
        self.state = PlaneState::default();
    }

    /// Reserve a slot for a `width` x `height` part (`width >= height`).
    ///
    /// The part goes right of the previous one; when it would cross `x_max`
    /// the row wraps and the next row starts below the tallest part seen so
    /// far in the current row, the wrapping part included. Once a part cannot fit even at the start of a fresh row
    /// the plane is marked full and every later call fails with
    /// [`NestingError::PlaneFull`]. Nothing is mutated on error except the
    /// full flag.
    pub fn place(&mut self, width: f64, height: f64) -> Result<PlacementSlot, NestingError> {
        if self.state.is_full {
            return Err(NestingError::PlaneFull);
        }
        let valid = width.is_finite() && height.is_finite() && height > 0.0 && width >= height;
        if !valid {
            return Err(NestingError::InvalidPartSize { width, height });
        }
        let cfg = self.config;
        if width > cfg.width() {
            return Err(NestingError::PartTooWide {
                width,
                available: cfg.width(),
            });
        }

        let mut next = self.state;
        next.tallest_in_row = next.tallest_in_row.max(height);
        let mut x = cfg.x_min + next.x_offset + width / 2.0;
        let mut y = cfg.y_max - next.y_offset - height / 2.0;

        if x + width / 2.0 > cfg.x_max {
            next.row += 1;
            next.x_offset = 0.0;
            next.y_offset += next.tallest_in_row + cfg.spacing;
            next.tallest_in_row = height;
            x = cfg.x_min + width / 2.0;
            y = cfg.y_max - next.y_offset - height / 2.0;
            debug!("row {} starts {:.1} mm below the top", next.row, next.y_offset);
        }

        // Rows only move down, so a part that misses here misses everywhere.
        if y - height / 2.0 < cfg.y_min {
            self.state.is_full = true;
            info!(
                "plane full after {} parts ({width:.1} x {height:.1} does not fit)",
                self.state.placed
            );
            return Err(NestingError::PlaneFull);
        }

        next.x_offset += width + cfg.spacing;
        next.placed += 1;
        self.state = next;

        Ok(PlacementSlot {
            center: Point2::new(x, y),
            width,
            height,
            row: next.row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn small_plane() -> PlacementPlane {
        PlacementPlane::new(PlaneConfig {
            x_min: 0.0,
            x_max: 200.0,
            y_min: 0.0,
            y_max: 200.0,
            spacing: 10.0,
        })
        .expect("plane")
    }

    #[test]
    fn third_part_wraps_to_second_row() {
        let mut plane = small_plane();
        let a = plane.place(80.0, 50.0).expect("first");
        let b = plane.place(80.0, 50.0).expect("second");
        let c = plane.place(80.0, 50.0).expect("third");

        assert_eq!((a.row, b.row, c.row), (0, 0, 1));
        assert_abs_diff_eq!(a.center.x, 40.0);
        assert_abs_diff_eq!(a.center.y, 175.0);
        assert_abs_diff_eq!(b.center.x, 130.0);
        assert_abs_diff_eq!(c.center.x, 40.0);
        assert_abs_diff_eq!(plane.state().y_offset, 60.0);
        assert_abs_diff_eq!(c.center.y, 200.0 - 60.0 - 25.0);
    }

    #[test]
    fn slots_in_a_row_do_not_overlap_and_stay_in_bounds() {
        let mut plane = PlacementPlane::new(PlaneConfig::default()).expect("plane");
        let mut slots = Vec::new();
        while let Ok(slot) = plane.place(70.0, 45.0) {
            slots.push(slot);
        }
        assert!(plane.is_full());
        assert!(slots.len() > 10);

        let cfg = *plane.config();
        for pair in slots.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let ((_, p_max), (n_min, _)) = (prev.bounds(), next.bounds());
            if prev.row == next.row {
                assert!(n_min.x >= p_max.x + cfg.spacing - 1e-9);
            } else {
                assert_eq!(next.row, prev.row + 1);
            }
        }
        for s in &slots {
            let (min, max) = s.bounds();
            assert!(min.x >= cfg.x_min - 1e-9 && max.x <= cfg.x_max + 1e-9);
            assert!(min.y >= cfg.y_min - 1e-9 && max.y <= cfg.y_max + 1e-9);
        }
    }

    #[test]
    fn part_taller_than_plane_is_full_immediately() {
        let mut plane = small_plane();
        assert_eq!(
            plane.place(250.0, 201.0),
            Err(NestingError::PartTooWide {
                width: 250.0,
                available: 200.0
            })
        );
        let mut plane = PlacementPlane::new(PlaneConfig {
            x_max: 1000.0,
            ..*small_plane().config()
        })
        .expect("plane");
        assert_eq!(plane.place(300.0, 201.0), Err(NestingError::PlaneFull));
        assert!(plane.is_full());
        assert_eq!(plane.state().placed, 0);
        assert_eq!(plane.place(10.0, 10.0), Err(NestingError::PlaneFull));
    }

    #[test]
    fn tallest_part_sets_row_pitch() {
        let mut plane = small_plane();
        plane.place(60.0, 20.0).expect("short");
        plane.place(60.0, 45.0).expect("tall");
        plane.place(40.0, 30.0).expect("fits at x 140..180");
        let wrapped = plane.place(40.0, 10.0).expect("wraps");
        assert_eq!(wrapped.row, 1);
        assert_abs_diff_eq!(plane.state().y_offset, 45.0 + 10.0);
        assert_abs_diff_eq!(plane.state().tallest_in_row, 10.0);
    }

    #[test]
    fn wrapping_part_counts_towards_row_pitch() {
        let mut plane = small_plane();
        plane.place(90.0, 20.0).expect("first");
        plane.place(90.0, 20.0).expect("second");
        let tall = plane.place(90.0, 45.0).expect("wraps");
        assert_eq!(tall.row, 1);
        assert_abs_diff_eq!(plane.state().y_offset, 45.0 + 10.0);
        assert_abs_diff_eq!(tall.center.y, 200.0 - 55.0 - 22.5);
        assert_abs_diff_eq!(plane.state().tallest_in_row, 45.0);
    }

    #[test]
    fn full_when_next_row_does_not_fit() {
        let mut plane = small_plane();
        let mut rows = 0;
        loop {
            match plane.place(150.0, 60.0) {
                Ok(slot) => rows = slot.row + 1,
                Err(e) => {
                    assert_eq!(e, NestingError::PlaneFull);
                    break;
                }
            }
        }
        // rows at y offsets 0, 70, 140 -> the third needs 200 mm, exactly fits
        assert_eq!(rows, 3);
        assert!(plane.is_full());

        plane.reset();
        assert!(!plane.is_full());
        assert_eq!(*plane.state(), PlaneState::default());
        assert!(plane.place(150.0, 60.0).is_ok());
    }

    #[test]
    fn rejects_invalid_sizes() {
        let mut plane = small_plane();
        for (w, h) in [(10.0, 20.0), (0.0, 0.0), (f64::NAN, 1.0), (5.0, -1.0)] {
            assert!(matches!(
                plane.place(w, h),
                Err(NestingError::InvalidPartSize { .. })
            ));
        }
        assert_eq!(*plane.state(), PlaneState::default());
    }

    #[test]
    fn config_is_validated() {
        let bad = PlaneConfig {
            x_min: 10.0,
            x_max: 10.0,
            ..PlaneConfig::default()
        };
        assert!(PlacementPlane::new(bad).is_err());
        let cfg: PlaneConfig = serde_json::from_str(r#"{ "spacing": 5 }"#).expect("config");
        assert_eq!(cfg.x_min, -450.0);
        assert_eq!(cfg.spacing, 5.0);
    }
}
