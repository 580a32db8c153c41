//! Camera property records for the reconstruction pipeline.
//!
//! A record carries image size, focal lengths, lens distortion and the derived
//! principal point and field-of-view angles, in the flat key layout used by
//! `transforms.json`-style reconstruction inputs.

use crate::error::DataError;
use glam::{DMat3, DVec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const REQUIRED_KEYS: [&str; 4] = ["w", "h", "fl_x", "fl_y"];

/// Intrinsics and distortion of a single camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraProperties {
    pub w: f64,
    pub h: f64,
    pub fl_x: f64,
    pub fl_y: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
    pub p1: f64,
    pub p2: f64,
    pub is_fisheye: bool,
    pub cx: f64,
    pub cy: f64,
    /// Horizontal field of view in radians.
    pub camera_angle_x: f64,
    /// Vertical field of view in radians.
    pub camera_angle_y: f64,
}

impl CameraProperties {
    /// Create an undistorted pinhole record with a centered principal point.
    pub fn new(w: f64, h: f64, fl_x: f64, fl_y: f64) -> Self {
        Self {
            w,
            h,
            fl_x,
            fl_y,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            k4: 0.0,
            p1: 0.0,
            p2: 0.0,
            is_fisheye: false,
            cx: w / 2.0,
            cy: h / 2.0,
            camera_angle_x: field_of_view(w, fl_x),
            camera_angle_y: field_of_view(h, fl_y),
        }
    }

    /// Override the principal point.
    pub fn with_principal_point(mut self, cx: f64, cy: f64) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    /// Build a record from a parsed key-value source.
    ///
    /// `w`, `h`, `fl_x` and `fl_y` are required; distortion terms default to zero,
    /// `is_fisheye` to false and `cx`/`cy` to the image center. Unknown keys are ignored.
    pub fn from_map(values: &Map<String, Value>) -> Result<Self, DataError> {
        if REQUIRED_KEYS.iter().any(|key| !values.contains_key(*key)) {
            return Err(DataError::Validation(
                "width (w), height (h) and focal lengths (fl_x & fl_y) must be included in the camera properties"
                    .into(),
            ));
        }

        let w = required_number(values, "w")?;
        let h = required_number(values, "h")?;
        let fl_x = required_number(values, "fl_x")?;
        let fl_y = required_number(values, "fl_y")?;
        for (key, value) in [("w", w), ("h", h), ("fl_x", fl_x), ("fl_y", fl_y)] {
            if value <= 0.0 {
                return Err(DataError::Validation(format!(
                    "camera property '{key}' must be positive, got {value}"
                )));
            }
        }

        let mut properties = Self::new(w, h, fl_x, fl_y);
        properties.k1 = optional_number(values, "k1", 0.0)?;
        properties.k2 = optional_number(values, "k2", 0.0)?;
        properties.k3 = optional_number(values, "k3", 0.0)?;
        properties.k4 = optional_number(values, "k4", 0.0)?;
        properties.p1 = optional_number(values, "p1", 0.0)?;
        properties.p2 = optional_number(values, "p2", 0.0)?;
        properties.cx = optional_number(values, "cx", properties.cx)?;
        properties.cy = optional_number(values, "cy", properties.cy)?;
        properties.is_fisheye = match values.get("is_fisheye") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(DataError::Validation(format!(
                    "camera property 'is_fisheye' must be a boolean, got {other}"
                )));
            }
        };

        Ok(properties)
    }

    /// Parse a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(values) => Self::from_map(&values),
            other => Err(DataError::Validation(format!(
                "camera properties must be a JSON object, got {other}"
            ))),
        }
    }

    /// Serialize the full record, derived fields included.
    pub fn to_json_string(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn focal_length(&self) -> DVec2 {
        DVec2::new(self.fl_x, self.fl_y)
    }

    pub fn principal_point(&self) -> DVec2 {
        DVec2::new(self.cx, self.cy)
    }

    /// Pinhole camera matrix `K` (column-major, as glam stores it).
    pub fn intrinsic_matrix(&self) -> DMat3 {
        DMat3::from_cols_array(&[
            self.fl_x, 0.0, 0.0, //
            0.0, self.fl_y, 0.0, //
            self.cx, self.cy, 1.0,
        ])
    }

    /// Field of view (horizontal, vertical) in degrees.
    pub fn fov_degrees(&self) -> DVec2 {
        DVec2::new(
            self.camera_angle_x.to_degrees(),
            self.camera_angle_y.to_degrees(),
        )
    }
}

/// Load and validate a camera properties JSON file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_camera_properties(path: impl AsRef<Path>) -> Result<CameraProperties, DataError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }

    debug!("Reading camera properties");
    let contents = fs::read_to_string(path)?;
    let properties = CameraProperties::from_json_str(&contents)?;

    info!(
        "Camera properties loaded: {}x{}, fov {:.2}x{:.2} deg",
        properties.w,
        properties.h,
        properties.fov_degrees().x,
        properties.fov_degrees().y
    );
    Ok(properties)
}

fn field_of_view(extent: f64, focal_length: f64) -> f64 {
    2.0 * (extent / (2.0 * focal_length)).atan()
}

fn required_number(values: &Map<String, Value>, key: &str) -> Result<f64, DataError> {
    match values.get(key) {
        Some(value) => as_number(key, value),
        None => Err(DataError::Validation(format!(
            "camera property '{key}' is required"
        ))),
    }
}

fn optional_number(values: &Map<String, Value>, key: &str, default: f64) -> Result<f64, DataError> {
    match values.get(key) {
        Some(value) => as_number(key, value),
        None => Ok(default),
    }
}

fn as_number(key: &str, value: &Value) -> Result<f64, DataError> {
    value.as_f64().ok_or_else(|| {
        DataError::Validation(format!(
            "camera property '{key}' must be numeric, got {value}"
        ))
    })
}
