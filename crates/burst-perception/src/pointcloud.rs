//! Sparse point cloud store.
//!
//! A [`PointCloud`] is a set of 3-D points keyed by their **exact**
//! coordinate.  Each point carries an opaque [`PointData`] payload.  Setting
//! a point at a coordinate that is already present replaces its payload and
//! leaves the size unchanged (last write wins).
//!
//! Iteration visits points in the order their coordinates were first
//! inserted.  That order is stable for a given cloud but carries no meaning.
//!
//! # Example
//!
//! ```rust
//! use burst_perception::pointcloud::{PointCloud, PointData};
//! use burst_perception::transform::Vec3;
//!
//! let mut cloud = PointCloud::new();
//! cloud.set(Vec3::new(0.0, 1.0, 2.0), PointData::default()).unwrap();
//! cloud.set(Vec3::new(0.0, 1.0, 2.0), PointData::with_value(7)).unwrap();
//!
//! assert_eq!(cloud.size(), 1);
//! assert_eq!(cloud.get(Vec3::new(0.0, 1.0, 2.0)).unwrap().value, Some(7));
//! ```

use std::collections::HashMap;

use burst_types::CloudError;

use crate::transform::Vec3;

/// Per-point payload.  Irrelevant to geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointData {
    pub color: Option<[u8; 3]>,
    pub value: Option<i32>,
    pub intensity: Option<u16>,
}

impl PointData {
    /// Payload carrying only a value marker.
    pub fn with_value(value: i32) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }
}

/// Hashable exact-coordinate key.  `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PointKey([u64; 3]);

impl PointKey {
    fn of(p: Vec3) -> Self {
        // Adding +0.0 turns -0.0 into +0.0 and leaves every other value alone.
        Self([
            (p.x + 0.0).to_bits(),
            (p.y + 0.0).to_bits(),
            (p.z + 0.0).to_bits(),
        ])
    }
}

/// A set of points with attached data, deduplicated by exact coordinate.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    entries: Vec<(Vec3, PointData)>,
    index: HashMap<PointKey, usize>,
}

impl PointCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `point`, or overwrite the data of an existing point at the same
    /// coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] if any coordinate is NaN or
    /// infinite.
    pub fn set(&mut self, point: Vec3, data: PointData) -> Result<(), CloudError> {
        if !point.is_finite() {
            return Err(CloudError::Validation(format!(
                "point {point:?} has a non-finite coordinate"
            )));
        }
        let key = PointKey::of(point);
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = data,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((point, data));
            }
        }
        Ok(())
    }

    /// Data stored at exactly `point`, if any.
    pub fn get(&self, point: Vec3) -> Option<&PointData> {
        self.index
            .get(&PointKey::of(point))
            .map(|&slot| &self.entries[slot].1)
    }

    /// `true` if a point exists at exactly `point`.
    pub fn contains(&self, point: Vec3) -> bool {
        self.index.contains_key(&PointKey::of(point))
    }

    /// Number of distinct coordinates.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit every point until `visit` returns `false`.
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(Vec3, &PointData) -> bool,
    {
        for (point, data) in &self.entries {
            if !visit(*point, data) {
                break;
            }
        }
    }

    /// Iterator over points and their data.
    pub fn points(&self) -> impl Iterator<Item = (Vec3, &PointData)> {
        self.entries.iter().map(|(p, d)| (*p, d))
    }

    /// The first point in iteration order.
    pub fn first(&self) -> Option<(Vec3, &PointData)> {
        self.entries.first().map(|(p, d)| (*p, d))
    }

    /// Build a cloud from `points`, each with default data.
    ///
    /// # Errors
    ///
    /// [`CloudError::Validation`] on the first non-finite point.
    pub fn try_from_points<I>(points: I) -> Result<Self, CloudError>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let points = points.into_iter();
        let mut cloud = Self::with_capacity(points.size_hint().0);
        for p in points {
            cloud.set(p, PointData::default())?;
        }
        Ok(cloud)
    }

    /// Centroid of all points; `None` for an empty cloud.
    pub fn mean(&self) -> Option<Vec3> {
        if self.entries.is_empty() {
            return None;
        }
        let sum = self
            .entries
            .iter()
            .fold(Vec3::zero(), |acc, (p, _)| acc.add(*p));
        Some(sum.scale(1.0 / self.entries.len() as f64))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cloud_is_empty() {
        let cloud = PointCloud::new();
        assert_eq!(cloud.size(), 0);
        assert!(cloud.is_empty());
        assert!(cloud.mean().is_none());
        assert!(cloud.first().is_none());
    }

    #[test]
    fn set_same_coordinate_overwrites_payload() {
        let mut cloud = PointCloud::new();
        let p = Vec3::new(0.0, 1.0, 2.0);
        cloud.set(p, PointData::with_value(1)).unwrap();
        cloud.set(p, PointData::with_value(2)).unwrap();
        assert_eq!(cloud.size(), 1);
        assert_eq!(cloud.get(p).unwrap().value, Some(2));
    }

    #[test]
    fn nearby_coordinates_are_distinct() {
        let mut cloud = PointCloud::new();
        cloud.set(Vec3::new(0.0, 0.0, 2.0), PointData::default()).unwrap();
        cloud
            .set(Vec3::new(0.0, 0.0, 2.0 + f64::EPSILON * 2.0), PointData::default())
            .unwrap();
        assert_eq!(cloud.size(), 2);
    }

    #[test]
    fn negative_zero_is_same_coordinate() {
        let mut cloud = PointCloud::new();
        cloud.set(Vec3::new(0.0, 0.0, 1.0), PointData::default()).unwrap();
        cloud.set(Vec3::new(-0.0, 0.0, 1.0), PointData::default()).unwrap();
        assert_eq!(cloud.size(), 1);
        assert!(cloud.contains(Vec3::new(-0.0, -0.0, 1.0)));
    }

    #[test]
    fn set_rejects_non_finite_point() {
        let mut cloud = PointCloud::new();
        let result = cloud.set(Vec3::new(f64::NAN, 0.0, 0.0), PointData::default());
        assert!(matches!(result, Err(CloudError::Validation(_))));
        let result = cloud.set(Vec3::new(0.0, f64::INFINITY, 0.0), PointData::default());
        assert!(matches!(result, Err(CloudError::Validation(_))));
        assert!(cloud.is_empty());
    }

    #[test]
    fn iterate_visits_in_first_insertion_order() {
        let cloud = PointCloud::try_from_points([
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ])
        .unwrap();

        let mut seen = Vec::new();
        cloud.iterate(|p, _| {
            seen.push(p.x);
            true
        });
        assert_eq!(seen, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn iterate_stops_when_callback_returns_false() {
        let cloud =
            PointCloud::try_from_points((0..10).map(|i| Vec3::new(i as f64, 0.0, 0.0))).unwrap();
        let mut visited = 0;
        cloud.iterate(|_, _| {
            visited += 1;
            visited < 3
        });
        assert_eq!(visited, 3);
    }

    #[test]
    fn mean_is_centroid() {
        let cloud =
            PointCloud::try_from_points([Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0)])
                .unwrap();
        assert_eq!(cloud.mean(), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn try_from_points_rejects_non_finite_point() {
        let result = PointCloud::try_from_points([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(f64::NAN, 0.0, 0.0),
        ]);
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[test]
    fn try_from_points_keeps_last_write_on_duplicates() {
        let cloud = PointCloud::try_from_points([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(cloud.size(), 2);
    }
}
