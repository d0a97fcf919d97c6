use std::fmt;

use serde::{Deserialize, Serialize};

/// Cartesian robot target: position in mm, orientation as Euler angles in
/// degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl RobotPose {
    pub fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self {
            x,
            y,
            z,
            rx,
            ry,
            rz,
        }
    }

    /// Tool pointing straight down (`rx = 180`, `ry = 0`).
    pub fn downward(x: f64, y: f64, z: f64, rz: f64) -> Self {
        Self::new(x, y, z, 180.0, 0.0, rz)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl fmt::Display for RobotPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}, {:.3}, {:.1}, {:.1}, {:.2}]",
            self.x, self.y, self.z, self.rx, self.ry, self.rz
        )
    }
}
