//! Per-capture summaries printed by the CLI.

use burst_perception::pointcloud::PointCloud;
use colored::Colorize;
use serde::Serialize;

/// What the CLI reports about one merged capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudSummary {
    pub capture: u64,
    pub frame: String,
    pub points: usize,
    /// Centroid `[x, y, z]` in millimetres; absent for an empty cloud.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 3]>,
}

impl CloudSummary {
    pub fn of(capture: u64, frame: &str, cloud: &PointCloud) -> Self {
        Self {
            capture,
            frame: frame.to_string(),
            points: cloud.size(),
            centroid: cloud.mean().map(|c| [c.x, c.y, c.z]),
        }
    }

    /// One human-readable line.
    pub fn render(&self) -> String {
        let centroid = match self.centroid {
            Some([x, y, z]) => format!("({x:.1}, {y:.1}, {z:.1}) mm"),
            None => "n/a".to_string(),
        };
        format!(
            "  #{:<4} {} points in '{}', centroid {}",
            self.capture,
            self.points.to_string().bold(),
            self.frame.cyan(),
            centroid
        )
    }

    /// One newline-delimited JSON record.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error":"{e}"}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burst_perception::transform::Vec3;

    #[test]
    fn summary_of_cloud() {
        let cloud =
            PointCloud::try_from_points([Vec3::new(0.0, 1.0, 2.0), Vec3::new(0.0, 0.0, 2.0)])
                .unwrap();
        let summary = CloudSummary::of(3, "world", &cloud);
        assert_eq!(summary.points, 2);
        assert_eq!(summary.centroid, Some([0.0, 0.5, 2.0]));

        colored::control::set_override(false);
        let line = summary.render();
        assert!(line.contains("2 points in 'world'"), "{line}");
        assert!(line.contains("(0.0, 0.5, 2.0) mm"), "{line}");
    }

    #[test]
    fn summary_of_empty_cloud_omits_centroid() {
        let summary = CloudSummary::of(1, "base", &PointCloud::new());
        assert!(summary.centroid.is_none());
        assert_eq!(
            summary.to_json(),
            r#"{"capture":1,"frame":"base","points":0}"#
        );
    }
}
