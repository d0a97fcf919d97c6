use log::info;
use nalgebra::{Point2, Vector2};
use pickplace_core::Contour;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Footprint, NestingError, PlacementPlane, PlacementSlot, PlaneConfig};

/// Where and how a picked part is put down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropPlacement {
    pub slot: PlacementSlot,
    /// Shift from the levelled footprint center to the slot center.
    pub translation: Vector2<f64>,
    /// Where the gripper's pickup point ends up.
    pub drop_point: Point2<f64>,
    /// Part outline as it will lie on the plane.
    pub placed_contour: Contour,
}

/// Drop-off planner owning the session's placement plane.
#[derive(Clone, Debug)]
pub struct NestingPlanner {
    plane: PlacementPlane,
}

impl NestingPlanner {
    pub fn new(config: PlaneConfig) -> Result<Self, NestingError> {
        Ok(Self {
            plane: PlacementPlane::new(config)?,
        })
    }

    #[inline]
    pub fn plane(&self) -> &PlacementPlane {
        &self.plane
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.plane.is_full()
    }

    pub fn reset(&mut self) {
        self.plane.reset();
    }

    /// Plan the drop of a part held at `pickup_point`.
    ///
    /// The gripper turns the part by `-orientation_deg` about the pickup
    /// point so its principal axis lies along X, then the levelled footprint
    /// is placed on the plane. All coordinates are in the plane's frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, contour), fields(points = contour.len()))
    )]
    pub fn plan_drop(
        &mut self,
        contour: &Contour,
        orientation_deg: f64,
        pickup_point: Point2<f64>,
    ) -> Result<DropPlacement, NestingError> {
        let footprint = Footprint::measure(contour, orientation_deg, pickup_point)?;
        let slot = self.plane.place(footprint.width, footprint.height)?;
        let translation = slot.center - footprint.center;
        info!(
            "part {:.1} x {:.1} mm -> row {} at ({:.1}, {:.1})",
            slot.width, slot.height, slot.row, slot.center.x, slot.center.y
        );
        Ok(DropPlacement {
            slot,
            translation,
            drop_point: pickup_point + translation,
            placed_contour: footprint.levelled.translated(translation),
        })
    }
}
