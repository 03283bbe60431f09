//! Capture configuration – reads `burstcloud.toml`.
//!
//! ```toml
//! target_frame = "world"
//!
//! [[frames]]
//! name = "base"
//! parent = "world"
//! [frames.pose.translation]
//! z = 120.0
//!
//! [[sources]]
//! name = "front_sonar"
//! model = "burst_ultrasonic"
//! frame = "base"
//! st_dev = 5.0
//! num_points = 500
//! distance_m = 1.2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use burst_types::{CloudError, FrameConfig, SourceConfig, WORLD_FRAME};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "burstcloud.toml";

/// Top-level capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Frame the merged cloud is expressed in.
    #[serde(default = "default_target_frame")]
    pub target_frame: String,

    /// Mounting frames, in dependency order.
    #[serde(default)]
    pub frames: Vec<FrameConfig>,

    /// Sources, in merge order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_target_frame() -> String {
    WORLD_FRAME.to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_frame: default_target_frame(),
            frames: Vec::new(),
            sources: Vec::new(),
        }
    }
}

/// Return the config path: `$BURSTCLOUD_CONFIG` if set, else
/// `./burstcloud.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("BURSTCLOUD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub fn load_from(path: &Path) -> Result<Option<CaptureConfig>, CloudError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        CloudError::Config(format!("failed to read config at {}: {}", path.display(), e))
    })?;
    let mut cfg = parse(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Parse a config document.
pub fn parse(raw: &str) -> Result<CaptureConfig, CloudError> {
    toml::from_str(raw).map_err(|e| CloudError::Config(format!("failed to parse config: {e}")))
}

/// Apply `BURSTCLOUD_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `BURSTCLOUD_TARGET_FRAME` | `target_frame` |
pub fn apply_env_overrides(cfg: &mut CaptureConfig) {
    if let Ok(v) = std::env::var("BURSTCLOUD_TARGET_FRAME")
        && !v.is_empty()
    {
        cfg.target_frame = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burst_types::SourceModel;

    const SAMPLE: &str = r#"
        [[frames]]
        name = "base"
        [frames.pose.translation]
        z = 120.0

        [[frames]]
        name = "sonar_mount"
        parent = "base"
        [frames.pose.orientation]
        type = "euler_degrees"
        yaw = 45.0

        [[sources]]
        name = "front_sonar"
        model = "burst_ultrasonic"
        frame = "sonar_mount"
        st_dev = 5.0
        num_points = 500
        distance_m = 1.2
        trigger_pin = "15"
        echo_interrupt_pin = "echo"
        board = "pi"
        timeout_ms = 1000

        [[sources]]
        name = "depth_cam"
        model = "sim_camera"
        points = [[0.0, 1.0, 2.0], [0.0, 0.0, 2.0]]
    "#;

    #[test]
    fn parses_sample_config() {
        let cfg = parse(SAMPLE).unwrap();
        assert_eq!(cfg.target_frame, "world");
        assert_eq!(cfg.frames.len(), 2);
        assert_eq!(cfg.frames[1].parent, "base");

        let sonar = &cfg.sources[0];
        assert_eq!(sonar.model, SourceModel::BurstUltrasonic);
        assert_eq!(sonar.frame_name(), "sonar_mount");
        assert_eq!(sonar.num_points, 500);
        assert_eq!(sonar.ultrasonic.timeout_ms, Some(1000));

        let cam = &cfg.sources[1];
        assert_eq!(cam.frame_name(), "depth_cam");
        assert_eq!(cam.points.len(), 2);
    }

    #[test]
    fn rejects_unknown_model() {
        let err = parse(
            r#"
            [[sources]]
            name = "x"
            model = "lidar"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CloudError::Config(_)));
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let cfg = parse(SAMPLE).unwrap();
        fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.frames, cfg.frames);
        assert_eq!(loaded.sources, cfg.sources);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = load_from(&dir.path().join("absent.toml")).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "target_frame = [").unwrap();
        assert!(matches!(load_from(&path), Err(CloudError::Config(_))));
    }

    #[test]
    fn apply_env_overrides_changes_target_frame() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("BURSTCLOUD_TARGET_FRAME", "base") };
        let mut cfg = CaptureConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.target_frame, "base");
        unsafe { std::env::remove_var("BURSTCLOUD_TARGET_FRAME") };
    }
}
