//! In-process simulated drivers for tests and hardware-free runs.
//!
//! [`SimDistanceSensor`] reports a fixed range; [`SimCloudCamera`] returns a
//! fixed point cloud.  Both record whether they have been closed and fail
//! reads afterwards, which lets lifecycle tests observe `close` propagation.
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() {
//! use burst_hal::camera::PointCloudCamera;
//! use burst_hal::context::ReadContext;
//! use burst_hal::sim::SimCloudCamera;
//! use burst_perception::transform::Vec3;
//!
//! let cam = SimCloudCamera::from_points("cam1", [Vec3::new(0.0, 1.0, 2.0)]).unwrap();
//! let cloud = cam.next_point_cloud(&ReadContext::background()).await.unwrap();
//! assert_eq!(cloud.size(), 1);
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use burst_perception::pointcloud::PointCloud;
use burst_perception::transform::Vec3;
use burst_types::CloudError;
use serde_json::json;

use crate::camera::{CameraProperties, DISTANCE_KEY, DistanceSensor, PointCloudCamera, Readings};
use crate::context::ReadContext;

// ────────────────────────────────────────────────────────────────────────────
// Stub distance sensor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated range sensor that always reports the same distance.
pub struct SimDistanceSensor {
    name: String,
    distance_m: f64,
    closed: Arc<AtomicBool>,
}

impl SimDistanceSensor {
    /// Create a sensor reporting `distance_m` metres.
    pub fn new(name: impl Into<String>, distance_m: f64) -> Box<Self> {
        Box::new(Self {
            name: name.into(),
            distance_m,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag set once [`DistanceSensor::close`] has run.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl DistanceSensor for SimDistanceSensor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn readings(&self, _ctx: &ReadContext) -> Result<Readings, CloudError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CloudError::read(&self.name, "sensor is closed"));
        }
        Ok(Readings::from([(DISTANCE_KEY.to_string(), json!(self.distance_m))]))
    }

    async fn close(&self) -> Result<(), CloudError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub point-cloud camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera returning a copy of a fixed cloud on every capture.
pub struct SimCloudCamera {
    name: String,
    cloud: PointCloud,
    closed: Arc<AtomicBool>,
}

impl SimCloudCamera {
    /// Create a camera returning `cloud`.
    pub fn new(name: impl Into<String>, cloud: PointCloud) -> Box<Self> {
        Box::new(Self {
            name: name.into(),
            cloud,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a camera returning the given points with default data.
    ///
    /// # Errors
    ///
    /// [`CloudError::Validation`] if any point is non-finite.
    pub fn from_points<I>(name: impl Into<String>, points: I) -> Result<Box<Self>, CloudError>
    where
        I: IntoIterator<Item = Vec3>,
    {
        Ok(Self::new(name, PointCloud::try_from_points(points)?))
    }

    /// Shared flag set once [`PointCloudCamera::close`] has run.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl PointCloudCamera for SimCloudCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_point_cloud(&self, _ctx: &ReadContext) -> Result<PointCloud, CloudError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CloudError::read(&self.name, "camera is closed"));
        }
        Ok(self.cloud.clone())
    }

    fn properties(&self) -> CameraProperties {
        CameraProperties::point_cloud_only()
    }

    async fn close(&self) -> Result<(), CloudError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::distance_from;

    #[tokio::test]
    async fn sim_sensor_reports_distance() {
        let sensor = SimDistanceSensor::new("sonar", 1.5);
        let readings = sensor.readings(&ReadContext::background()).await.unwrap();
        assert_eq!(distance_from("sonar", &readings).unwrap(), 1.5);
    }

    #[tokio::test]
    async fn sim_sensor_fails_after_close() {
        let sensor = SimDistanceSensor::new("sonar", 1.5);
        sensor.close().await.unwrap();
        assert!(sensor.closed_flag().load(Ordering::SeqCst));
        let result = sensor.readings(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Read { .. })));
    }

    #[tokio::test]
    async fn sim_camera_returns_independent_copies() {
        let cam = SimCloudCamera::from_points("cam", [Vec3::new(1.0, 2.0, 3.0)]).unwrap();
        let ctx = ReadContext::background();
        let mut first = cam.next_point_cloud(&ctx).await.unwrap();
        first.set(Vec3::new(9.0, 9.0, 9.0), Default::default()).unwrap();

        let second = cam.next_point_cloud(&ctx).await.unwrap();
        assert_eq!(first.size(), 2);
        assert_eq!(second.size(), 1);
    }

    #[test]
    fn sim_camera_rejects_non_finite_points() {
        let result = SimCloudCamera::from_points(
            "cam",
            [Vec3::new(f64::NAN, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
        );
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[tokio::test]
    async fn sim_camera_fails_after_close() {
        let cam = SimCloudCamera::from_points("cam", [Vec3::zero()]).unwrap();
        cam.close().await.unwrap();
        let result = cam.next_point_cloud(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Read { .. })));
    }
}
