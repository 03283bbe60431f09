//! Source and camera contracts.
//!
//! Two upstream roles feed the synthesis layer:
//!
//! - [`DistanceSensor`] – reports a bag of named readings, one of which is
//!   `"distance"` in metres.
//! - [`PointCloudCamera`] – returns a full [`PointCloud`] on demand.
//!
//! [`RangeSource`] is the sum of the two.  [`PointCloudCamera`] is also the
//! downstream contract: burst and merged cameras implement it so a host can
//! compose them like any other camera.

use std::collections::HashMap;

use async_trait::async_trait;
use burst_perception::pointcloud::PointCloud;
use burst_types::CloudError;
use serde_json::Value;

use crate::context::ReadContext;

/// Named sensor readings, e.g. `{"distance": 1.25}`.
pub type Readings = HashMap<String, Value>;

/// Key under which a [`DistanceSensor`] reports its range, in metres.
pub const DISTANCE_KEY: &str = "distance";

/// Extract the `"distance"` reading.
///
/// # Errors
///
/// Returns [`CloudError::Read`] if the key is missing or not a number.
pub fn distance_from(sensor: &str, readings: &Readings) -> Result<f64, CloudError> {
    readings
        .get(DISTANCE_KEY)
        .and_then(Value::as_f64)
        .ok_or_else(|| CloudError::read(sensor, "unable to convert distance to a float"))
}

/// A raw image frame.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data.
    pub data: Vec<u8>,
}

/// Kind of image stream a camera would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageType {
    #[default]
    Unspecified,
    Color,
    Depth,
}

/// Static capabilities advertised by a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraProperties {
    pub supports_point_cloud: bool,
    pub image_type: ImageType,
}

impl CameraProperties {
    /// Properties of a camera that only synthesises point clouds.
    pub fn point_cloud_only() -> Self {
        Self {
            supports_point_cloud: true,
            image_type: ImageType::Unspecified,
        }
    }
}

/// A scalar range sensor.
#[async_trait]
pub trait DistanceSensor: Send + Sync {
    /// Stable identifier, e.g. `"front_sonar"`.
    fn name(&self) -> &str;

    /// Take one reading.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Read`] when the sensor cannot be read.
    async fn readings(&self, ctx: &ReadContext) -> Result<Readings, CloudError>;

    /// Release the underlying device.
    async fn close(&self) -> Result<(), CloudError>;
}

/// A point-cloud producing camera.
#[async_trait]
pub trait PointCloudCamera: Send + Sync {
    /// Stable identifier, e.g. `"merged"`.
    fn name(&self) -> &str;

    /// Capture the next point cloud.  The caller owns the result.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Read`] (or the error of an upstream stage) when
    /// no cloud can be produced.
    async fn next_point_cloud(&self, ctx: &ReadContext) -> Result<PointCloud, CloudError>;

    fn properties(&self) -> CameraProperties;

    /// Capture a 2-D image.  Point-cloud-only cameras report
    /// [`CloudError::Unimplemented`].
    async fn read_image(&self, _ctx: &ReadContext) -> Result<CameraFrame, CloudError> {
        Err(CloudError::Unimplemented(format!(
            "image capture is not supported by '{}'",
            self.name()
        )))
    }

    /// Release the camera and anything it wraps.
    async fn close(&self) -> Result<(), CloudError>;
}

/// An upstream source: either a bare range sensor or a camera that already
/// returns geometry.
pub enum RangeSource {
    Distance(Box<dyn DistanceSensor>),
    Cloud(Box<dyn PointCloudCamera>),
}

impl RangeSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Distance(sensor) => sensor.name(),
            Self::Cloud(camera) => camera.name(),
        }
    }

    pub async fn close(&self) -> Result<(), CloudError> {
        match self {
            Self::Distance(sensor) => sensor.close().await,
            Self::Cloud(camera) => camera.close().await,
        }
    }
}

impl std::fmt::Debug for RangeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distance(sensor) => f.debug_tuple("Distance").field(&sensor.name()).finish(),
            Self::Cloud(camera) => f.debug_tuple("Cloud").field(&camera.name()).finish(),
        }
    }
}
