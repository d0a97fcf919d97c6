//! Core geometry for pick-and-place planning.
//!
//! This crate is purely geometric. It knows nothing about cameras, robots or
//! matching strategies: it provides closed contours and their moments, angle
//! normalization, planar homographies, minimum-area rectangles, filled
//! silhouette overlap and the workpiece template model the higher layers
//! operate on.

mod angle;
mod contour;
mod error;
mod homography;
mod logger;
mod min_rect;
mod pickup_area;
mod raster;
mod template;

pub use angle::{angular_distance_deg, normalize_angle_deg};
pub use contour::{rotate_point, BoundingBox, Contour, Moments};
pub use error::GeometryError;
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use min_rect::{convex_hull, MinAreaRect};
pub use pickup_area::{PickupArea, PickupAreaSplit};
pub use raster::{mask_overlap, RasterGrid, RasterParams, SilhouetteMask};
pub use template::{GripperId, PatternEntry, PickupPoint, WorkpieceTemplate};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_logging, init_with_level, LogConfig, DEFAULT_TRACING_FILTER};
