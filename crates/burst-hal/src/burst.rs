//! Burst camera: a range source presented as a point-cloud camera.
//!
//! Each call to [`PointCloudCamera::next_point_cloud`] reads the wrapped
//! [`RangeSource`] once and expands the result with a [`RangeSampler`]:
//!
//! | Source | Policy |
//! |---|---|
//! | [`RangeSource::Distance`] | `"distance"` (metres) → millimetres → [`RangeSampler::expand_scalar`] |
//! | [`RangeSource::Cloud`] | first upstream point → [`RangeSampler::expand`] (point kept exactly) |
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() {
//! use burst_hal::burst::BurstUltrasonic;
//! use burst_hal::camera::{PointCloudCamera, RangeSource};
//! use burst_hal::context::ReadContext;
//! use burst_hal::sim::SimDistanceSensor;
//! use burst_perception::sampler::SamplingParameters;
//!
//! let sensor = SimDistanceSensor::new("front_sonar", 1.0);
//! let params = SamplingParameters::new(5.0, 200).unwrap();
//! let camera = BurstUltrasonic::new("front_sonar", RangeSource::Distance(sensor), params, Some(1));
//!
//! let cloud = camera.next_point_cloud(&ReadContext::background()).await.unwrap();
//! assert_eq!(cloud.size(), 200);
//! # }
//! ```

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use burst_perception::pointcloud::PointCloud;
use burst_perception::sampler::{RangeSampler, SamplingParameters};
use burst_types::CloudError;
use tracing::{debug, instrument};

use crate::camera::{CameraProperties, PointCloudCamera, RangeSource, distance_from};
use crate::context::ReadContext;

const MILLIMETRES_PER_METRE: f64 = 1000.0;

/// Range source wrapped as a synthetic point-cloud camera.
pub struct BurstUltrasonic {
    name: String,
    source: RangeSource,
    params: SamplingParameters,
    sampler: Mutex<RangeSampler>,
}

impl BurstUltrasonic {
    /// Wrap `source`.  `seed` fixes the noise sequence; `None` draws from
    /// OS entropy.
    pub fn new(
        name: impl Into<String>,
        source: RangeSource,
        params: SamplingParameters,
        seed: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            params,
            sampler: Mutex::new(RangeSampler::from_seed_option(seed)),
        }
    }

    pub fn params(&self) -> &SamplingParameters {
        &self.params
    }

    pub fn source(&self) -> &RangeSource {
        &self.source
    }

    fn sample<F>(&self, draw: F) -> Result<PointCloud, CloudError>
    where
        F: FnOnce(&mut RangeSampler) -> Result<PointCloud, CloudError>,
    {
        let mut sampler = self.sampler.lock().unwrap_or_else(PoisonError::into_inner);
        draw(&mut sampler)
    }
}

#[async_trait]
impl PointCloudCamera for BurstUltrasonic {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, ctx), fields(camera = %self.name))]
    async fn next_point_cloud(&self, ctx: &ReadContext) -> Result<PointCloud, CloudError> {
        match &self.source {
            RangeSource::Distance(sensor) => {
                let readings = ctx.run(sensor.readings(ctx)).await?;
                let distance_m = distance_from(sensor.name(), &readings)?;
                debug!(distance_m, "range reading");
                self.sample(|s| s.expand_scalar(distance_m * MILLIMETRES_PER_METRE, &self.params))
            }
            RangeSource::Cloud(camera) => {
                let upstream = ctx.run(camera.next_point_cloud(ctx)).await?;
                let Some((base, _)) = upstream.first() else {
                    return Err(CloudError::read(camera.name(), "upstream point cloud is empty"));
                };
                debug!(x = base.x, y = base.y, z = base.z, "burst base point");
                self.sample(|s| s.expand(base, &self.params))
            }
        }
    }

    fn properties(&self) -> CameraProperties {
        CameraProperties::point_cloud_only()
    }

    async fn close(&self) -> Result<(), CloudError> {
        self.source.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{DistanceSensor, Readings};
    use crate::sim::{SimCloudCamera, SimDistanceSensor};
    use burst_perception::transform::Vec3;
    use serde_json::json;

    struct BrokenSensor;

    #[async_trait]
    impl DistanceSensor for BrokenSensor {
        fn name(&self) -> &str {
            "broken"
        }

        async fn readings(&self, _ctx: &ReadContext) -> Result<Readings, CloudError> {
            Err(CloudError::read("broken", "echo timeout"))
        }

        async fn close(&self) -> Result<(), CloudError> {
            Ok(())
        }
    }

    struct TextSensor;

    #[async_trait]
    impl DistanceSensor for TextSensor {
        fn name(&self) -> &str {
            "text"
        }

        async fn readings(&self, _ctx: &ReadContext) -> Result<Readings, CloudError> {
            Ok(Readings::from([("distance".to_string(), json!("1m"))]))
        }

        async fn close(&self) -> Result<(), CloudError> {
            Ok(())
        }
    }

    fn params(sigma: f64, n: usize) -> SamplingParameters {
        SamplingParameters::new(sigma, n).unwrap()
    }

    #[tokio::test]
    async fn distance_source_is_converted_to_millimetres() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(SimDistanceSensor::new("sonar", 1.0)),
            params(5.0, 10_000),
            Some(11),
        );
        let cloud = camera.next_point_cloud(&ReadContext::background()).await.unwrap();

        assert_eq!(cloud.size(), 10_000);
        let mean = cloud.mean().unwrap();
        assert!((mean.z - 1000.0).abs() < 1.0, "mean z = {}", mean.z);
        assert!(mean.y.abs() < 1.0, "mean y = {}", mean.y);
    }

    #[tokio::test]
    async fn distance_source_zero_sigma_is_exact() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(SimDistanceSensor::new("sonar", 0.5)),
            params(0.0, 100),
            Some(1),
        );
        let cloud = camera.next_point_cloud(&ReadContext::background()).await.unwrap();
        assert_eq!(cloud.size(), 1);
        assert!(cloud.contains(Vec3::new(0.0, 0.0, 500.0)));
    }

    #[tokio::test]
    async fn cloud_source_keeps_base_point() {
        let upstream = SimCloudCamera::from_points("cam", [Vec3::new(0.0, 0.0, 1000.0)]).unwrap();
        let camera = BurstUltrasonic::new(
            "burst",
            RangeSource::Cloud(upstream),
            params(5.0, 10_000),
            Some(12),
        );
        let cloud = camera.next_point_cloud(&ReadContext::background()).await.unwrap();

        assert_eq!(cloud.size(), 10_000);
        assert!(cloud.contains(Vec3::new(0.0, 0.0, 1000.0)));
        cloud.iterate(|p, _| {
            assert_eq!(p.x, 0.0);
            true
        });
    }

    #[tokio::test]
    async fn empty_upstream_cloud_is_read_error() {
        let upstream = SimCloudCamera::from_points("cam", Vec::<Vec3>::new()).unwrap();
        let camera = BurstUltrasonic::new("burst", RangeSource::Cloud(upstream), params(1.0, 5), None);
        let result = camera.next_point_cloud(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Read { .. })));
    }

    #[tokio::test]
    async fn sensor_failure_propagates() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(Box::new(BrokenSensor)),
            params(1.0, 5),
            None,
        );
        let result = camera.next_point_cloud(&ReadContext::background()).await;
        assert_eq!(result.unwrap_err(), CloudError::read("broken", "echo timeout"));
    }

    #[tokio::test]
    async fn non_numeric_distance_is_read_error() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(Box::new(TextSensor)),
            params(1.0, 5),
            None,
        );
        let result = camera.next_point_cloud(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Read { .. })));
    }

    #[tokio::test]
    async fn cancelled_context_aborts_read() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(SimDistanceSensor::new("sonar", 1.0)),
            params(1.0, 5),
            None,
        );
        let (ctx, handle) = ReadContext::with_cancel();
        handle.cancel();
        assert_eq!(camera.next_point_cloud(&ctx).await.unwrap_err(), CloudError::Cancelled);
    }

    #[tokio::test]
    async fn properties_and_read_image() {
        let camera = BurstUltrasonic::new(
            "sonar",
            RangeSource::Distance(SimDistanceSensor::new("sonar", 1.0)),
            params(1.0, 5),
            None,
        );
        assert!(camera.properties().supports_point_cloud);
        let result = camera.read_image(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Unimplemented(_))));
    }

    #[tokio::test]
    async fn close_closes_wrapped_sensor() {
        let sensor = SimDistanceSensor::new("sonar", 1.0);
        let closed = sensor.closed_flag();
        let camera = BurstUltrasonic::new("sonar", RangeSource::Distance(sensor), params(1.0, 5), None);

        camera.close().await.unwrap();
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
        let result = camera.next_point_cloud(&ReadContext::background()).await;
        assert!(matches!(result, Err(CloudError::Read { .. })));
    }
}
