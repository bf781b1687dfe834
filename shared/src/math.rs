use serde::{Deserialize, Serialize};

/// Represents a vector in the 2D arena plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vec2 {
    /// Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    /// Value along the y-axis.
    /// Positive direction is up.
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Projects a wire point onto the arena plane. The out-of-plane axis is dropped.
    pub fn from_xyz(point: (f32, f32, f32)) -> Self {
        Vec2 {
            x: point.0,
            y: point.1,
        }
    }

    pub fn to_xyz(self) -> (f32, f32, f32) {
        (self.x, self.y, 0.0)
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector, or zero for a zero-length vector.
    pub fn normalize(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vec2::ZERO
        } else {
            Vec2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns `self - other`.
    pub fn sub(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        self.sub(other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Moves `current` toward `target` by at most `max_delta`.
///
/// Never overshoots: when the remaining distance is within `max_delta` the
/// result is exactly `target`.
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let offset = target.sub(&current);
    let distance = offset.magnitude();
    if distance <= max_delta || distance == 0.0 {
        return target;
    }
    current.add(&offset.scale(max_delta / distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = Vec2::new(3.0, 4.0).normalize();
        assert_approx_eq!(v.magnitude(), 1.0, 1e-6);
        assert_approx_eq!(v.x, 0.6, 1e-6);
        assert_approx_eq!(v.y, 0.8, 1e-6);
    }

    #[test]
    fn test_move_towards_partial_step() {
        let next = move_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 3.0);
        assert_approx_eq!(next.x, 3.0, 1e-6);
        assert_approx_eq!(next.y, 0.0, 1e-6);
    }

    #[test]
    fn test_move_towards_snaps_without_overshoot() {
        let target = Vec2::new(1.0, 1.0);
        let next = move_towards(Vec2::new(0.9, 0.9), target, 5.0);
        assert_eq!(next, target);
    }

    #[test]
    fn test_from_xyz_drops_depth() {
        let v = Vec2::from_xyz((1.5, -2.0, 9.0));
        assert_eq!(v, Vec2::new(1.5, -2.0));
        assert_eq!(v.to_xyz(), (1.5, -2.0, 0.0));
    }
}
