//! Merged camera: several sources composed into one cloud.
//!
//! Every capture reads all sources concurrently, then transforms each
//! source's points from its mounting frame into the target frame and inserts
//! them into a single output cloud.
//!
//! # Ordering
//!
//! Reads may complete in any order, but inserts always happen on the calling
//! task in **source-list order**.  When two sources produce the same
//! transformed coordinate, the later source's data wins.
//!
//! # Failure
//!
//! Any failed read, unknown frame, or cancellation fails the whole capture;
//! no partial cloud is returned.

use std::sync::Arc;

use async_trait::async_trait;
use burst_perception::pointcloud::PointCloud;
use burst_perception::sampler::SamplingParameters;
use burst_perception::transform::FrameSystem;
use burst_types::{CloudError, WORLD_FRAME};
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use crate::burst::BurstUltrasonic;
use crate::camera::{CameraProperties, PointCloudCamera, RangeSource};
use crate::context::ReadContext;

/// One merge input: a camera and the frame it is mounted in.
pub struct MergeInput {
    camera: Box<dyn PointCloudCamera>,
    frame: String,
}

impl MergeInput {
    /// A camera that already returns geometry.
    pub fn camera(camera: Box<dyn PointCloudCamera>, frame: impl Into<String>) -> Self {
        Self {
            camera,
            frame: frame.into(),
        }
    }

    /// A range source.  Distance sensors are expanded with the scalar burst
    /// policy using `params`; cloud sources are used unchanged.
    pub fn range(
        source: RangeSource,
        frame: impl Into<String>,
        params: SamplingParameters,
        seed: Option<u64>,
    ) -> Self {
        let camera: Box<dyn PointCloudCamera> = match source {
            RangeSource::Cloud(camera) => camera,
            distance @ RangeSource::Distance(_) => {
                let name = distance.name().to_string();
                Box::new(BurstUltrasonic::new(name, distance, params, seed))
            }
        };
        Self::camera(camera, frame)
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }
}

/// Composes several sources into one cloud in `target` frame.
pub struct MergedCamera {
    name: String,
    inputs: Vec<MergeInput>,
    frames: Arc<FrameSystem>,
    target: String,
}

impl MergedCamera {
    /// Build a merged camera targeting `"world"`.
    ///
    /// # Errors
    ///
    /// See [`MergedCamera::with_target`].
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<MergeInput>,
        frames: Arc<FrameSystem>,
    ) -> Result<Self, CloudError> {
        Self::with_target(name, inputs, frames, WORLD_FRAME)
    }

    /// Build a merged camera targeting `target`.
    ///
    /// # Errors
    ///
    /// [`CloudError::FrameNotFound`] if the target or any input's frame is
    /// not registered in `frames`.
    pub fn with_target(
        name: impl Into<String>,
        inputs: Vec<MergeInput>,
        frames: Arc<FrameSystem>,
        target: impl Into<String>,
    ) -> Result<Self, CloudError> {
        let target = target.into();
        if !frames.contains(&target) {
            return Err(CloudError::FrameNotFound(target));
        }
        if let Some(input) = inputs.iter().find(|i| !frames.contains(&i.frame)) {
            return Err(CloudError::FrameNotFound(input.frame.clone()));
        }
        Ok(Self {
            name: name.into(),
            inputs,
            frames,
            target,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn source_count(&self) -> usize {
        self.inputs.len()
    }

    /// Read every source and merge the results into the target frame.
    ///
    /// # Errors
    ///
    /// The first source error, a frame resolution error, or
    /// [`CloudError::Cancelled`].
    #[instrument(skip(self, ctx), fields(camera = %self.name, target = %self.target))]
    pub async fn merge(&self, ctx: &ReadContext) -> Result<PointCloud, CloudError> {
        let reads = self.inputs.iter().map(|input| async move {
            let cloud = input.camera.next_point_cloud(ctx).await?;
            debug!(source = input.camera.name(), points = cloud.size(), "source read");
            Ok::<_, CloudError>(cloud)
        });
        // try_join_all yields results in input order regardless of completion
        // order, and drops the remaining reads on the first error.
        let clouds = ctx.run(try_join_all(reads)).await?;

        let capacity = clouds.iter().map(PointCloud::size).sum();
        let mut merged = PointCloud::with_capacity(capacity);
        for (input, cloud) in self.inputs.iter().zip(&clouds) {
            let pose = self.frames.resolve(&input.frame, &self.target)?;
            for (point, data) in cloud.points() {
                merged.set(pose.transform_point(point), *data)?;
            }
        }

        info!(
            sources = self.inputs.len(),
            points = merged.size(),
            "merged point cloud"
        );
        Ok(merged)
    }
}

#[async_trait]
impl PointCloudCamera for MergedCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_point_cloud(&self, ctx: &ReadContext) -> Result<PointCloud, CloudError> {
        self.merge(ctx).await
    }

    fn properties(&self) -> CameraProperties {
        CameraProperties::point_cloud_only()
    }

    /// Close every source.  All sources are attempted; the first error is
    /// returned.
    async fn close(&self) -> Result<(), CloudError> {
        let mut first_err = None;
        for input in &self.inputs {
            if let Err(e) = input.camera.close().await {
                warn!(source = input.camera.name(), error = %e, "failed to close source");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
