//! Vector and coordinate math for the simulation
//!
//! World units: 100 units per metre. `x`/`y` lie on the ground plane (screen
//! y grows downward) and `z` is the height above the ground.
//!
//! # Rust Learning Notes
//!
//! - **Operator overloading**: `std::ops::{Add, Sub, Mul, Div}` let vectors be
//!   combined with `+`, `-`, `*` and `/` just like numbers.
//! - **Smart constructors**: `NormalizedVector3D` keeps its fields private so
//!   the only way to get one is through a constructor that checks the input.

use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Tolerance used by `Vector3D::is_zero`
pub const ZERO_EPSILON: f64 = 0.001;

/// A point in the world: ground-plane `x`/`y` plus height `z`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldCoordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        WorldCoordinate { x, y, z }
    }

    pub fn distance_from(&self, other: WorldCoordinate) -> f64 {
        Vector3D::between(*self, other).magnitude()
    }

    /// Squared distance on the ground plane only (height ignored)
    pub fn distance_from_squared_xy(&self, other: WorldCoordinate) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn midpoint(&self, other: WorldCoordinate) -> WorldCoordinate {
        self.lerp_percent(other, 50.0)
    }

    /// Point `percent`% of the way from `self` towards `other`
    pub fn lerp_percent(&self, other: WorldCoordinate, percent: f64) -> WorldCoordinate {
        let t = percent / 100.0;
        WorldCoordinate {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn offset(&self, by: Vector3D) -> WorldCoordinate {
        WorldCoordinate {
            x: self.x + by.x,
            y: self.y + by.y,
            z: self.z + by.z,
        }
    }
}

/// A free 3D vector used for velocities, forces and momentum
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }

    /// Vector pointing from `start` to `end`
    pub fn between(start: WorldCoordinate, end: WorldCoordinate) -> Self {
        Vector3D {
            x: end.x - start.x,
            y: end.y - start.y,
            z: end.z - start.z,
        }
    }

    /// All components within `ZERO_EPSILON` of zero
    pub fn is_zero(&self) -> bool {
        self.x.abs() <= ZERO_EPSILON && self.y.abs() <= ZERO_EPSILON && self.z.abs() <= ZERO_EPSILON
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Same vector with the height component dropped
    pub fn flattened(&self) -> Vector3D {
        Vector3D::new(self.x, self.y, 0.0)
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    fn add(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    fn sub(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;

    fn neg(self) -> Vector3D {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;

    fn mul(self, scalar: f64) -> Vector3D {
        Vector3D::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Component-wise product
impl Mul for Vector3D {
    type Output = Vector3D;

    fn mul(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl Div<f64> for Vector3D {
    type Output = Vector3D;

    fn div(self, scalar: f64) -> Vector3D {
        Vector3D::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

/// A unit-length direction.
///
/// Construction fails with `SimError::ZeroVector` for an all-zero input; a
/// direction without length has no meaning for movement, aim or throws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVector3D {
    x: f64,
    y: f64,
    z: f64,
}

impl Default for NormalizedVector3D {
    /// Facing +x
    fn default() -> Self {
        NormalizedVector3D { x: 1.0, y: 0.0, z: 0.0 }
    }
}

impl NormalizedVector3D {
    pub fn new(v: Vector3D) -> Result<Self> {
        if v.x == 0.0 && v.y == 0.0 && v.z == 0.0 {
            return Err(SimError::ZeroVector);
        }
        let magnitude = v.magnitude();
        Ok(NormalizedVector3D {
            x: v.x / magnitude,
            y: v.y / magnitude,
            z: v.z / magnitude,
        })
    }

    /// Direction from `start` towards `end`
    pub fn between(start: WorldCoordinate, end: WorldCoordinate) -> Result<Self> {
        Self::new(Vector3D::between(start, end))
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn as_vector(&self) -> Vector3D {
        Vector3D::new(self.x, self.y, self.z)
    }

    /// Heading on the ground plane in whole degrees, 0 = +x, 90 = screen up.
    ///
    /// Screen y points down, so y is flipped before taking the angle. The
    /// fractional part is truncated and the result folded into `[0, 360)`.
    pub fn xy_direction_degrees(&self) -> f64 {
        let degrees = (-self.y).atan2(self.x).to_degrees();
        ((360 + degrees as i32) % 360) as f64
    }

    /// Rotates around the z axis. Length is preserved, `z` is untouched.
    pub fn rotate_xy(&mut self, degrees: f64) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let x = self.x * cos - self.y * sin;
        let y = self.x * sin + self.y * cos;
        self.x = x;
        self.y = y;
    }
}

impl Mul<f64> for NormalizedVector3D {
    type Output = Vector3D;

    fn mul(self, scalar: f64) -> Vector3D {
        self.as_vector() * scalar
    }
}

/// Inclusive-exclusive range a random value is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomRange {
    pub min: f64,
    pub max: f64,
}

impl RandomRange {
    pub fn new(min: f64, max: f64) -> Self {
        RandomRange { min, max }
    }

    /// Uniform sample in `[min, max)`; an empty range yields `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..self.max)
    }
}
