//! Shared error type and configuration records for the burstcloud workspace.
//!
//! Every crate returns [`CloudError`]; the `*Config` records are the plain
//! serde shapes produced by the configuration loader and consumed by the
//! frame system and the camera factory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the implicit root frame every frame graph starts with.
pub const WORLD_FRAME: &str = "world";

/// Global error type spanning parameter validation, source reads, frame
/// resolution, and unsupported camera operations.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CloudError {
    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Read Error on {sensor}: {details}")]
    Read { sensor: String, details: String },

    #[error("Frame Not Found: {0}")]
    FrameNotFound(String),

    #[error("Duplicate Frame: {0}")]
    DuplicateFrame(String),

    #[error("Missing Parent '{parent}' for frame '{frame}'")]
    MissingParent { frame: String, parent: String },

    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Config Error: {0}")]
    Config(String),
}

impl CloudError {
    /// Convenience constructor for [`CloudError::Read`].
    pub fn read(sensor: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Read {
            sensor: sensor.into(),
            details: details.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Frame configuration
// ────────────────────────────────────────────────────────────────────────────

/// A translation in the parent frame, in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// Orientation of a frame relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrientationConfig {
    /// Unit quaternion (normalised on load).
    Quaternion { w: f64, x: f64, y: f64, z: f64 },
    /// Intrinsic roll/pitch/yaw in degrees.
    EulerDegrees {
        #[serde(default)]
        roll: f64,
        #[serde(default)]
        pitch: f64,
        #[serde(default)]
        yaw: f64,
    },
}

/// Pose of a frame relative to its parent.  Missing orientation means no
/// rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<OrientationConfig>,
}

/// One `(frame, parent, pose)` tuple as supplied by the configuration loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent: String,
    #[serde(default)]
    pub pose: PoseConfig,
}

fn default_parent() -> String {
    WORLD_FRAME.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Source configuration
// ────────────────────────────────────────────────────────────────────────────

/// Which camera implementation the factory builds for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceModel {
    /// Scalar range sensor expanded into a cloud around `(0, 0, distance)`.
    BurstUltrasonic,
    /// Upstream point-cloud camera whose first point is expanded in place.
    BurstCamera,
    /// Point-cloud camera returning its configured points unchanged.
    SimCamera,
}

/// GPIO wiring of a physical ultrasonic sensor.  The core never drives the
/// pins; they are passed through to whichever driver backs the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UltrasonicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_interrupt_pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u32>,
}

/// Configuration of a single range source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub model: SourceModel,
    /// Frame the source is mounted in.  Defaults to the source name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// Standard deviation of the burst noise, in millimetres.
    #[serde(default)]
    pub st_dev: f64,
    /// Number of points per burst.
    #[serde(default = "default_num_points")]
    pub num_points: usize,
    /// Fixed RNG seed; random entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub ultrasonic: UltrasonicConfig,
    /// Simulated distance reading, in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    /// Simulated camera points, in millimetres.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f64; 3]>,
}

impl SourceConfig {
    /// The frame this source is mounted in.
    pub fn frame_name(&self) -> &str {
        self.frame.as_deref().unwrap_or(&self.name)
    }
}

fn default_num_points() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_error_display() {
        let err = CloudError::read("front_sonar", "timeout");
        assert!(err.to_string().contains("front_sonar"));
        assert!(err.to_string().contains("timeout"));

        let err = CloudError::MissingParent {
            frame: "cam".to_string(),
            parent: "arm".to_string(),
        };
        assert!(err.to_string().contains("'arm'"));
    }

    #[test]
    fn cloud_error_serialization_roundtrip() {
        let err = CloudError::FrameNotFound("ghost".to_string());
        let json = serde_json::to_string(&err).unwrap();
        let back: CloudError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn frame_config_defaults_parent_to_world() {
        let frame: FrameConfig = toml::from_str(r#"name = "base""#).unwrap();
        assert_eq!(frame.parent, WORLD_FRAME);
        assert_eq!(frame.pose, PoseConfig::default());
    }

    #[test]
    fn frame_config_parses_euler_orientation() {
        let frame: FrameConfig = toml::from_str(
            r#"
            name = "sonar"
            parent = "base"
            [pose.translation]
            x = 100.0
            [pose.orientation]
            type = "euler_degrees"
            yaw = 90.0
            "#,
        )
        .unwrap();
        assert_eq!(frame.pose.translation.x, 100.0);
        assert_eq!(
            frame.pose.orientation,
            Some(OrientationConfig::EulerDegrees {
                roll: 0.0,
                pitch: 0.0,
                yaw: 90.0
            })
        );
    }

    #[test]
    fn source_config_defaults() {
        let src: SourceConfig = toml::from_str(
            r#"
            name = "front_sonar"
            model = "burst_ultrasonic"
            trigger_pin = "15"
            echo_interrupt_pin = "echo"
            board = "pi"
            "#,
        )
        .unwrap();
        assert_eq!(src.model, SourceModel::BurstUltrasonic);
        assert_eq!(src.frame_name(), "front_sonar");
        assert_eq!(src.st_dev, 0.0);
        assert_eq!(src.num_points, 1);
        assert_eq!(src.ultrasonic.board.as_deref(), Some("pi"));
        assert!(src.ultrasonic.timeout_ms.is_none());
    }
}
