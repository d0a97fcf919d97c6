//! JSON job and report files.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::{Point2, Vector2};
use pickplace_core::{Contour, GripperId, Homography, PatternEntry, WorkpieceTemplate};
use pickplace_nesting::{PlaneConfig, PlaneState};
use pickplace_robot::CalibrationConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineParams, FrameReport, PickPlaceEngine};

#[derive(thiserror::Error, Debug)]
pub enum JobIoError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, JobIoError> {
    let data = fs::read_to_string(path).map_err(|source| JobIoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| JobIoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), JobIoError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| JobIoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| JobIoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One frame of work: templates, detected contours and the cell setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub templates: Vec<WorkpieceTemplate>,
    /// Detected contours in camera pixels.
    pub contours: Vec<Contour>,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub plane: PlaneConfig,
    #[serde(default)]
    pub engine: EngineParams,
}

/// Output of [`JobConfig::run`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub frame: FrameReport,
    /// Nesting cursor after the frame.
    pub plane: PlaneState,
}

impl JobConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, JobIoError> {
        load_json(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), JobIoError> {
        write_json(self, path.as_ref())
    }

    /// Run the job as a single frame on a fresh plane.
    pub fn run(&self) -> Result<JobReport, EngineError> {
        let mut engine = PickPlaceEngine::new(
            self.engine.clone(),
            self.calibration.clone(),
            self.plane,
        )?;
        let frame = engine.process_frame(&self.templates, &self.contours);
        Ok(JobReport {
            frame,
            plane: *engine.plane_state(),
        })
    }

    /// Runnable sample: an L-bracket, a plate with a hole pattern and a
    /// speck of noise, seen by a 0.5 mm/px camera.
    pub fn example() -> Self {
        let bracket = WorkpieceTemplate::new(
            "bracket",
            Contour::from_xy(&[
                [0.0, 0.0],
                [240.0, 0.0],
                [240.0, 60.0],
                [70.0, 60.0],
                [70.0, 160.0],
                [0.0, 160.0],
            ]),
            GripperId(0),
        )
        .with_pickup_point(Point2::new(35.0, 30.0))
        .with_height(6.0);

        let hole = |x: f64, y: f64| PatternEntry {
            contour: Contour::from_xy(&[[x, y], [x + 16.0, y], [x + 16.0, y + 16.0], [x, y + 16.0]]),
            settings: serde_json::json!({ "tool": "drill", "depth_mm": 4.0 }),
        };
        let plate = WorkpieceTemplate::new(
            "plate",
            Contour::from_xy(&[[0.0, 0.0], [300.0, 0.0], [300.0, 120.0], [0.0, 120.0]]),
            GripperId(1),
        )
        .with_pattern("holes", hole(30.0, 50.0))
        .with_pattern("holes", hole(254.0, 50.0))
        .with_height(4.0);

        let placed = |t: &WorkpieceTemplate, angle: f64, at: Vector2<f64>| {
            let c = t.main_contour.centroid();
            t.main_contour.rotated(angle, c).translated(at - c.coords)
        };
        let contours = vec![
            placed(&bracket, 35.0, Vector2::new(420.0, 380.0)),
            placed(&plate, -20.0, Vector2::new(900.0, 520.0)),
            Contour::from_xy(&[[1100.0, 150.0], [1112.0, 150.0], [1106.0, 161.0]]),
        ];

        let calibration = CalibrationConfig {
            homography: Homography::from_array([
                [0.5, 0.0, -320.0],
                [0.0, 0.5, 200.0],
                [0.0, 0.0, 1.0],
            ]),
            ..CalibrationConfig::default()
        };

        Self {
            templates: vec![bracket, plate],
            contours,
            calibration,
            plane: PlaneConfig::default(),
            engine: EngineParams::default(),
        }
    }
}

impl JobReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, JobIoError> {
        load_json(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), JobIoError> {
        write_json(self, path.as_ref())
    }
}
