//! `burst-hal` – device seams for range sources and synthetic cameras.
//!
//! # Modules
//!
//! - [`context`] – [`ReadContext`][context::ReadContext]: cancellation signal
//!   threaded through every source read.
//! - [`camera`] – the [`PointCloudCamera`][camera::PointCloudCamera] contract
//!   consumed from upstream cameras and offered to downstream hosts, plus the
//!   scalar [`DistanceSensor`][camera::DistanceSensor] contract.
//! - [`burst`] – [`BurstUltrasonic`][burst::BurstUltrasonic]: turns one range
//!   reading into a dense cloud.
//! - [`merged`] – [`MergedCamera`][merged::MergedCamera]: composes several
//!   sources into one cloud in a shared frame.
//! - [`sim`] – in-process drivers for tests and hardware-free runs.
//! - [`factory`] – builds cameras from configuration records.

pub mod burst;
pub mod camera;
pub mod context;
pub mod factory;
pub mod merged;
pub mod sim;
