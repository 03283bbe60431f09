//! Burst expansion of a single range measurement.
//!
//! A ranging sensor reports one distance, but its beam has real angular and
//! lateral spread.  [`RangeSampler`] approximates that spread by drawing
//! independent Gaussian offsets around the measurement:
//!
//! - [`RangeSampler::expand`] keeps an existing point exactly and adds
//!   `N − 1` perturbed copies `(x, y + 𝒩(0, σ), z + 𝒩(0, σ))`.
//! - [`RangeSampler::expand_scalar`] draws all `N` points as
//!   `(0, 𝒩(0, σ), 𝒩(d, σ))`; none of them is guaranteed to equal `d`.
//!
//! Points that land on the same coordinate collapse in the
//! [`PointCloud`], so the result may hold fewer than `N` points.  With
//! `σ = 0` every draw collapses onto the base point and the cloud has size 1.
//!
//! # Example
//!
//! ```rust
//! use burst_perception::sampler::{RangeSampler, SamplingParameters};
//! use burst_perception::transform::Vec3;
//!
//! let params = SamplingParameters::new(5.0, 100).unwrap();
//! let mut sampler = RangeSampler::seeded(7);
//!
//! let base = Vec3::new(0.0, 0.0, 1000.0);
//! let cloud = sampler.expand(base, &params).unwrap();
//! assert!(cloud.contains(base));
//! assert_eq!(cloud.size(), 100);
//! ```

use burst_types::CloudError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use crate::pointcloud::{PointCloud, PointData};
use crate::transform::Vec3;

// ────────────────────────────────────────────────────────────────────────────
// SamplingParameters
// ────────────────────────────────────────────────────────────────────────────

/// Validated burst parameters: standard deviation `σ ≥ 0` and point count
/// `N ≥ 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParameters {
    std_dev: f64,
    num_points: usize,
}

impl SamplingParameters {
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] if `std_dev` is negative or not
    /// finite, or if `num_points` is zero.
    pub fn new(std_dev: f64, num_points: usize) -> Result<Self, CloudError> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(CloudError::Validation(format!(
                "standard deviation must be finite and >= 0, got {std_dev}"
            )));
        }
        if num_points == 0 {
            return Err(CloudError::Validation(
                "number of points must be >= 1, got 0".to_string(),
            ));
        }
        Ok(Self {
            std_dev,
            num_points,
        })
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RangeSampler
// ────────────────────────────────────────────────────────────────────────────

/// Gaussian burst generator.  Owns its RNG; seed it for reproducible output.
#[derive(Debug, Clone)]
pub struct RangeSampler {
    rng: StdRng,
}

impl RangeSampler {
    /// A sampler with a fixed seed.  Two samplers with the same seed produce
    /// identical clouds.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A sampler seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A seeded sampler when `seed` is given, otherwise an entropy-seeded one.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Expand around an existing point.  `base` is always a member of the
    /// returned cloud.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] if `base` is not finite.
    pub fn expand(
        &mut self,
        base: Vec3,
        params: &SamplingParameters,
    ) -> Result<PointCloud, CloudError> {
        let sigma = params.std_dev();
        let mut cloud = PointCloud::with_capacity(params.num_points());
        cloud.set(base, PointData::default())?;

        for _ in 1..params.num_points() {
            let y = self.gaussian(sigma);
            let dz = self.gaussian(sigma);
            cloud.set(Vec3::new(base.x, base.y + y, base.z + dz), PointData::default())?;
        }

        debug!(
            requested = params.num_points(),
            produced = cloud.size(),
            sigma,
            "expanded point burst"
        );
        Ok(cloud)
    }

    /// Expand a bare distance along +Z.  All points are drawn.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] if `distance` is not finite.
    pub fn expand_scalar(
        &mut self,
        distance: f64,
        params: &SamplingParameters,
    ) -> Result<PointCloud, CloudError> {
        if !distance.is_finite() {
            return Err(CloudError::Validation(format!(
                "distance must be finite, got {distance}"
            )));
        }
        let sigma = params.std_dev();
        let mut cloud = PointCloud::with_capacity(params.num_points());

        for _ in 0..params.num_points() {
            let y = self.gaussian(sigma);
            let z = distance + self.gaussian(sigma);
            cloud.set(Vec3::new(0.0, y, z), PointData::default())?;
        }

        debug!(
            distance,
            requested = params.num_points(),
            produced = cloud.size(),
            sigma,
            "expanded scalar burst"
        );
        Ok(cloud)
    }

    #[inline]
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * std_dev
    }
}
