//! Rotation primitives: vectors, quaternions and the Y-X-Z Euler decomposition
//! the rotation filter compares against.
//!
//! Quaternions are stored in VMC wire order (X, Y, Z, W).  All angles are in
//! radians.

/// A 3-D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const UNIT_X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const UNIT_Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Orientation as three Euler angles in radians.
///
/// Produced by [`Quaternion::to_euler_yxz`]: `x` holds the pitch, `y` the
/// yaw (heading) and `z` the roll.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Per-axis absolute difference to `other`.
    pub fn abs_diff(self, other: Self) -> Self {
        Self::new(
            (self.x - other.x).abs(),
            (self.y - other.y).abs(),
            (self.z - other.z).abs(),
        )
    }

    /// The largest of the three components.
    pub fn max_component(self) -> f32 {
        self.x.max(self.y.max(self.z))
    }
}

/// A rotation quaternion in (X, Y, Z, W) order.
///
/// Not required to be normalised; rotation uses the true inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians about the X axis.
    pub fn from_x_axis_angle(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(s, 0.0, 0.0, c)
    }

    /// Rotation of `angle` radians about the Y axis.
    pub fn from_y_axis_angle(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(0.0, s, 0.0, c)
    }

    /// Rotation of `angle` radians about the Z axis.
    pub fn from_z_axis_angle(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(0.0, 0.0, s, c)
    }

    /// Composes `Ry(yaw) · Rx(pitch) · Rz(roll)`.
    pub fn from_euler_yxz(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self::from_y_axis_angle(yaw)
            .mul(Self::from_x_axis_angle(pitch))
            .mul(Self::from_z_axis_angle(roll))
    }

    /// Hamilton product: `self` applied after `rhs`.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    pub fn norm_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Multiplicative inverse.  The zero quaternion maps to itself, so
    /// rotating by it collapses every vector to zero instead of producing NaN.
    pub fn inverse(self) -> Self {
        let n = self.norm_squared();
        if n == 0.0 {
            return self;
        }
        Self::new(-self.x / n, -self.y / n, -self.z / n, self.w / n)
    }

    /// Rotates `v`: `q · v · q⁻¹`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(v.x, v.y, v.z, 0.0);
        let r = self.mul(p).mul(self.inverse());
        Vec3::new(r.x, r.y, r.z)
    }

    /// Decomposes the rotation into heading (about Y), pitch (about X) and
    /// roll (about Z), such that `from_euler_yxz(yaw, pitch, roll)` rebuilds it.
    ///
    /// The result is reassigned by axis: pitch goes to `x`, yaw to `y`, roll
    /// to `z`.  Downstream diagnostics rely on this exact assignment.
    pub fn to_euler_yxz(self) -> EulerAngles {
        let forward = self.rotate(Vec3::UNIT_Z);
        let yaw = forward.x.atan2(forward.z);
        let pitch = -forward
            .y
            .atan2((forward.x * forward.x + forward.z * forward.z).sqrt());

        // Roll is the signed angle between our X axis and the X axis of the
        // same heading/pitch without roll, measured around `forward`.
        let unrolled = Self::from_euler_yxz(yaw, pitch, 0.0).rotate(Vec3::UNIT_X);
        let right = self.rotate(Vec3::UNIT_X);
        let sin = right.cross(unrolled).dot(forward);
        let cos = right.dot(unrolled);
        let roll = -sin.atan2(cos);

        EulerAngles::new(pitch, yaw, roll)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
