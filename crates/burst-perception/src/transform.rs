//! Frame System.
//!
//! Maintains the mounting tree of named reference frames and the rigid-body
//! poses (translation + quaternion rotation) relating each frame to its
//! parent.  Given any two frame names the system walks both parent chains to
//! their nearest common ancestor and composes the resulting [`Pose`].
//!
//! Frames live in an arena indexed by integer id; each record stores the id
//! of its parent.  The implicit root, `"world"`, is id `0`.  Frames can only
//! be attached to an already registered parent, so the tree is acyclic and
//! connected by construction.
//!
//! # Example
//!
//! ```rust
//! use burst_perception::transform::{FrameSystem, Pose, Quaternion, Vec3};
//!
//! let mut frames = FrameSystem::new();
//!
//! // robot_base is 1 m forward of the world origin, same orientation.
//! frames
//!     .add_frame("robot_base", "world",
//!         Pose::new(Vec3::new(1000.0, 0.0, 0.0), Quaternion::identity()))
//!     .unwrap();
//!
//! // sonar is 0.5 m forward of robot_base, same orientation.
//! frames
//!     .add_frame("sonar", "robot_base",
//!         Pose::new(Vec3::new(500.0, 0.0, 0.0), Quaternion::identity()))
//!     .unwrap();
//!
//! let pose = frames.resolve("sonar", "world").unwrap();
//! assert!((pose.translation.x - 1500.0).abs() < 1e-9);
//! ```

use std::collections::HashMap;

use burst_types::{CloudError, FrameConfig, OrientationConfig, PoseConfig, WORLD_FRAME};

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector or point, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// `true` when every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1); see [`Quaternion::normalize`].
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` around `axis`.  The axis need not be
    /// normalised.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero or non-finite axis.
    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Result<Self, CloudError> {
        let norm = (axis.x * axis.x + axis.y * axis.y + axis.z * axis.z).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(CloudError::Validation(format!(
                "rotation axis {axis:?} must be finite and non-zero"
            )));
        }
        Ok(Self::about_unit_axis(
            Vec3::new(axis.x / norm, axis.y / norm, axis.z / norm),
            angle_rad,
        ))
    }

    /// Rotation from roll (X), pitch (Y) and yaw (Z) in degrees, applied
    /// intrinsically in Z-Y-X order.
    pub fn from_euler_deg(roll: f64, pitch: f64, yaw: f64) -> Self {
        let qx = Self::about_unit_axis(Vec3::new(1.0, 0.0, 0.0), roll.to_radians());
        let qy = Self::about_unit_axis(Vec3::new(0.0, 1.0, 0.0), pitch.to_radians());
        let qz = Self::about_unit_axis(Vec3::new(0.0, 0.0, 1.0), yaw.to_radians());
        qz.mul(qy).mul(qx)
    }

    fn about_unit_axis(axis: Vec3, angle_rad: f64) -> Self {
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Scale to unit length.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero or non-finite quaternion.
    pub fn normalize(self) -> Result<Self, CloudError> {
        let norm = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(CloudError::Validation(format!(
                "quaternion {self:?} cannot be normalised"
            )));
        }
        Ok(Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm))
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
///
/// Represents the pose of frame B relative to frame A: to convert a point
/// expressed in frame B into frame A, rotate it by `rotation` then add
/// `translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create a pose from a translation and rotation.
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity pose (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// A pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quaternion::identity())
    }

    /// Compose two poses: `self` applied after `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation.add(self.rotation.rotate(other.translation));
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }

    /// The inverse pose: T_A_B → T_B_A.
    pub fn inverse(self) -> Self {
        let inv_rot = self.rotation.conjugate();
        Self::new(inv_rot.rotate(self.translation).scale(-1.0), inv_rot)
    }

    /// Map a point from the child frame into the parent frame:
    /// `p' = rotation · p + translation`.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p).add(self.translation)
    }
}

impl TryFrom<&PoseConfig> for Pose {
    type Error = CloudError;

    fn try_from(cfg: &PoseConfig) -> Result<Self, Self::Error> {
        let t = cfg.translation;
        let translation = Vec3::new(t.x, t.y, t.z);
        if !translation.is_finite() {
            return Err(CloudError::Validation(format!(
                "pose translation {translation:?} is not finite"
            )));
        }
        let rotation = match cfg.orientation {
            None => Quaternion::identity(),
            Some(OrientationConfig::Quaternion { w, x, y, z }) => {
                Quaternion::new(w, x, y, z).normalize()?
            }
            Some(OrientationConfig::EulerDegrees { roll, pitch, yaw }) => {
                Quaternion::from_euler_deg(roll, pitch, yaw).normalize()?
            }
        };
        Ok(Self::new(translation, rotation))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FrameSystem
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct FrameRecord {
    name: String,
    /// `None` only for the root.
    parent: Option<usize>,
    /// Pose of this frame in its parent.
    pose: Pose,
}

/// A tree of named reference frames rooted at `"world"`.
///
/// Built once at configuration time with [`FrameSystem::add_frame`] (or
/// [`FrameSystem::from_configs`]) and read-only afterwards.  There is no way
/// to re-parent or remove a frame.
#[derive(Debug, Clone)]
pub struct FrameSystem {
    frames: Vec<FrameRecord>,
    index: HashMap<String, usize>,
}

impl Default for FrameSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSystem {
    /// Create a frame system containing only the `"world"` root.
    pub fn new() -> Self {
        let root = FrameRecord {
            name: WORLD_FRAME.to_string(),
            parent: None,
            pose: Pose::identity(),
        };
        let mut index = HashMap::new();
        index.insert(WORLD_FRAME.to_string(), 0);
        Self {
            frames: vec![root],
            index,
        }
    }

    /// Build a frame system from loader tuples, added in the given order.
    ///
    /// # Errors
    ///
    /// Propagates the first [`FrameSystem::add_frame`] or pose conversion
    /// failure.
    pub fn from_configs(configs: &[FrameConfig]) -> Result<Self, CloudError> {
        let mut system = Self::new();
        for cfg in configs {
            let pose = Pose::try_from(&cfg.pose)?;
            system.add_frame(&cfg.name, &cfg.parent, pose)?;
        }
        Ok(system)
    }

    /// Register `name` as a child of `parent` at `pose`.
    ///
    /// # Errors
    ///
    /// - [`CloudError::DuplicateFrame`] if `name` is already registered.
    /// - [`CloudError::MissingParent`] if `parent` is not registered yet.
    pub fn add_frame(&mut self, name: &str, parent: &str, pose: Pose) -> Result<(), CloudError> {
        if self.index.contains_key(name) {
            return Err(CloudError::DuplicateFrame(name.to_string()));
        }
        let Some(&parent_id) = self.index.get(parent) else {
            return Err(CloudError::MissingParent {
                frame: name.to_string(),
                parent: parent.to_string(),
            });
        };
        let id = self.frames.len();
        self.frames.push(FrameRecord {
            name: name.to_string(),
            parent: Some(parent_id),
            pose,
        });
        self.index.insert(name.to_string(), id);
        Ok(())
    }

    /// `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of frames, including the root.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame names in registration order, starting with `"world"`.
    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.name.as_str())
    }

    /// Name of the parent of `name`; `None` for the root.
    ///
    /// # Errors
    ///
    /// [`CloudError::FrameNotFound`] if `name` is not registered.
    pub fn parent_of(&self, name: &str) -> Result<Option<&str>, CloudError> {
        let id = self.lookup(name)?;
        Ok(self.frames[id]
            .parent
            .map(|p| self.frames[p].name.as_str()))
    }

    /// Compute the [`Pose`] that maps points expressed in `from` into `to`.
    ///
    /// # Errors
    ///
    /// [`CloudError::FrameNotFound`] if either frame is not registered.
    pub fn resolve(&self, from: &str, to: &str) -> Result<Pose, CloudError> {
        let from_id = self.lookup(from)?;
        let to_id = self.lookup(to)?;
        if from_id == to_id {
            return Ok(Pose::identity());
        }

        let from_chain = self.ancestry(from_id);
        let to_chain = self.ancestry(to_id);
        // Both chains end at the root, so a common ancestor always exists.
        let common = from_chain
            .iter()
            .copied()
            .find(|id| to_chain.contains(id))
            .unwrap_or(0);

        let ancestor_from = self.pose_below(from_id, common);
        let ancestor_to = self.pose_below(to_id, common);
        Ok(ancestor_to.inverse().compose(ancestor_from))
    }

    fn lookup(&self, name: &str) -> Result<usize, CloudError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CloudError::FrameNotFound(name.to_string()))
    }

    /// Ids from `id` up to and including the root.
    fn ancestry(&self, id: usize) -> Vec<usize> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.frames[current].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Pose of frame `id` expressed in its ancestor `ancestor`.
    fn pose_below(&self, id: usize, ancestor: usize) -> Pose {
        let mut acc = Pose::identity();
        let mut current = id;
        while current != ancestor {
            let record = &self.frames[current];
            acc = record.pose.compose(acc);
            match record.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        acc
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
