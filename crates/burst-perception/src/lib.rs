//! `burst-perception` – geometry and synthesis layer.
//!
//! Pure, synchronous building blocks used by the device layer to turn sparse
//! range readings into dense point clouds expressed in a shared frame.
//!
//! # Modules
//!
//! - [`transform`] – [`FrameSystem`][transform::FrameSystem]: arena-backed
//!   tree of named mounting frames that resolves the rigid-body
//!   [`Pose`][transform::Pose] between any two of them.
//! - [`pointcloud`] – [`PointCloud`][pointcloud::PointCloud]: sparse point
//!   set keyed by exact coordinate, last write wins.
//! - [`sampler`] – [`RangeSampler`][sampler::RangeSampler]: Gaussian burst
//!   expansion of a single measurement into a populated cloud.

pub mod pointcloud;
pub mod sampler;
pub mod transform;
