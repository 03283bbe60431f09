//! Camera factory.
//!
//! Turns [`SourceConfig`] records into ready-to-use cameras.  This is the
//! explicit, static replacement for runtime model registration: the
//! composition root calls [`build_camera`] (or [`build_merged`]) directly.
//!
//! | Model | Built camera |
//! |---|---|
//! | `burst_ultrasonic` | [`BurstUltrasonic`] over a [`RangeSource::Distance`] |
//! | `burst_camera` | [`BurstUltrasonic`] over a [`RangeSource::Cloud`] |
//! | `sim_camera` | [`SimCloudCamera`] |
//!
//! No GPIO driver ships with the workspace, so `burst_ultrasonic` sources
//! are backed by a [`SimDistanceSensor`] reporting `distance_m`.

use std::sync::Arc;

use burst_perception::pointcloud::PointCloud;
use burst_perception::sampler::SamplingParameters;
use burst_perception::transform::{FrameSystem, Vec3};
use burst_types::{CloudError, SourceConfig, SourceModel};
use tracing::info;

use crate::burst::BurstUltrasonic;
use crate::camera::{PointCloudCamera, RangeSource};
use crate::merged::{MergeInput, MergedCamera};
use crate::sim::{SimCloudCamera, SimDistanceSensor};

/// Build the camera described by `cfg`.
///
/// # Errors
///
/// [`CloudError::Validation`] for invalid sampling parameters or a source
/// lacking the data its model needs.
pub fn build_camera(cfg: &SourceConfig) -> Result<Box<dyn PointCloudCamera>, CloudError> {
    let camera: Box<dyn PointCloudCamera> = match cfg.model {
        SourceModel::BurstUltrasonic => {
            let params = SamplingParameters::new(cfg.st_dev, cfg.num_points)?;
            let Some(distance_m) = cfg.distance_m else {
                return Err(CloudError::Validation(format!(
                    "source '{}': no ultrasonic driver available for board {:?}; set distance_m to simulate",
                    cfg.name, cfg.ultrasonic.board
                )));
            };
            let sensor = SimDistanceSensor::new(&cfg.name, distance_m);
            Box::new(BurstUltrasonic::new(
                &cfg.name,
                RangeSource::Distance(sensor),
                params,
                cfg.seed,
            ))
        }
        SourceModel::BurstCamera => {
            let params = SamplingParameters::new(cfg.st_dev, cfg.num_points)?;
            let upstream = SimCloudCamera::new(format!("{}_upstream", cfg.name), cloud_from(cfg)?);
            Box::new(BurstUltrasonic::new(
                &cfg.name,
                RangeSource::Cloud(upstream),
                params,
                cfg.seed,
            ))
        }
        SourceModel::SimCamera => SimCloudCamera::new(&cfg.name, cloud_from(cfg)?),
    };

    info!(
        source = %cfg.name,
        model = ?cfg.model,
        frame = cfg.frame_name(),
        "built camera"
    );
    Ok(camera)
}

/// Build a [`MergedCamera`] over every configured source, in order.
///
/// # Errors
///
/// Any [`build_camera`] error, or [`CloudError::FrameNotFound`] when a
/// source's frame or `target` is not in `frames`.
pub fn build_merged(
    name: &str,
    sources: &[SourceConfig],
    frames: Arc<FrameSystem>,
    target: &str,
) -> Result<MergedCamera, CloudError> {
    let inputs = sources
        .iter()
        .map(|cfg| Ok(MergeInput::camera(build_camera(cfg)?, cfg.frame_name())))
        .collect::<Result<Vec<_>, CloudError>>()?;
    MergedCamera::with_target(name, inputs, frames, target)
}

fn cloud_from(cfg: &SourceConfig) -> Result<PointCloud, CloudError> {
    if cfg.points.is_empty() {
        return Err(CloudError::Validation(format!(
            "source '{}': model {:?} needs at least one point",
            cfg.name, cfg.model
        )));
    }
    PointCloud::try_from_points(cfg.points.iter().map(|&[x, y, z]| Vec3::new(x, y, z)))
}
