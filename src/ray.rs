use nalgebra::{Point3, Unit, Vector3};

use crate::picture::Color;

/// Half-line used to query the scene. The direction is always unit length so
/// that distances reported by different primitives are comparable.
#[derive(Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction: Unit::new_normalize(direction) }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Nearest surface a ray touched. `t` is the distance along the ray and is
/// never negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use nalgebra::{point, vector};

    use super::*;

    #[test]
    fn direction_is_normalized_on_construction() {
        let ray = Ray::new(Point3::origin(), vector![3.0, 0.0, -4.0]);
        assert!((ray.direction.norm() - 1.0).abs() < 1e-6);
        assert_eq!(ray.at(5.0), point![3.0, 0.0, -4.0]);
    }
}
