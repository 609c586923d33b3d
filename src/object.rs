use std::ops::RangeBounds;

use float_ord::FloatOrd;
use nalgebra::{Point3, Unit, Vector3};

use crate::error::ConfigError;
use crate::picture::Color;
use crate::ray::{Hit, Ray};

/// Below this `|dot(direction, normal)|` a ray counts as parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Sphere { center, radius }
    }

    /// Distance to the nearest root of `|O + tD - C|² = r²` that lies in `t_rng`.
    pub fn hit<R>(&self, ray: &Ray, t_rng: R) -> Option<f32>
        where R: RangeBounds<f32> {
        let oc = ray.origin - self.center;
        let a = ray.direction.norm_squared();
        let half_b = oc.dot(&*ray.direction);
        let c = oc.norm_squared() - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // find the nearest root that lies in the acceptable range.
        let mut root = (-half_b - sqrtd) / a;
        if !t_rng.contains(&root) {
            root = (-half_b + sqrtd) / a;
            if !t_rng.contains(&root) {
                return None;
            }
        }
        Some(root)
    }
}

/// Infinite plane through `point`. The normal is kept at unit length.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub point: Point3<f32>,
    pub normal: Unit<Vector3<f32>>,
}

impl Plane {
    pub fn new(point: Point3<f32>, normal: Vector3<f32>) -> Result<Self, ConfigError> {
        let normal = Unit::try_new(normal, f32::EPSILON).ok_or(ConfigError::DegenerateNormal)?;
        Ok(Plane { point, normal })
    }

    pub fn hit<R>(&self, ray: &Ray, t_rng: R) -> Option<f32>
        where R: RangeBounds<f32> {
        let denom = ray.direction.dot(&*self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.point - ray.origin).dot(&*self.normal) / denom;
        t_rng.contains(&t).then_some(t)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Plane(Plane),
}

impl Shape {
    pub fn hit<R>(&self, ray: &Ray, t_rng: R) -> Option<f32>
        where R: RangeBounds<f32> {
        match self {
            Shape::Sphere(sphere) => sphere.hit(ray, t_rng),
            Shape::Plane(plane) => plane.hit(ray, t_rng),
        }
    }
}

/// A shape with the flat color it is shaded with.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub color: Color,
}

impl Primitive {
    pub fn sphere(center: Point3<f32>, radius: f32, color: Color) -> Self {
        Primitive { shape: Shape::Sphere(Sphere::new(center, radius)), color }
    }

    pub fn plane(point: Point3<f32>, normal: Vector3<f32>, color: Color) -> Result<Self, ConfigError> {
        Ok(Primitive { shape: Shape::Plane(Plane::new(point, normal)?), color })
    }
}

/// Ordered, validated set of primitives. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new(primitives: Vec<Primitive>) -> Result<Self, ConfigError> {
        for primitive in &primitives {
            if let Shape::Sphere(sphere) = &primitive.shape {
                if !(sphere.radius > 0.0 && sphere.radius.is_finite()) {
                    return Err(ConfigError::InvalidRadius(sphere.radius));
                }
            }
        }
        Ok(Scene { primitives })
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Tests the ray against every primitive and keeps the closest hit.
    pub fn hit(&self, ray: &Ray) -> Option<Hit> {
        self.primitives.iter()
            .filter_map(|primitive| {
                primitive.shape.hit(ray, 0.0..).map(|t| Hit { t, color: primitive.color })
            })
            .min_by_key(|hit| FloatOrd(hit.t))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{point, vector};

    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn ray_toward_sphere_center_reports_the_near_root() {
        let sphere = Sphere::new(point![0.0, 0.0, -5.0], 1.0);
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0]);
        let t = sphere.hit(&ray, 0.0..).unwrap();
        assert!(close(t, 4.0));

        let far = sphere.hit(&ray, t + 1e-3..).unwrap();
        assert!(t <= far);
        assert!(close(far, 6.0));
    }

    #[test]
    fn ray_from_inside_sphere_reports_the_exit() {
        let sphere = Sphere::new(point![1.0, 2.0, 3.0], 2.0);
        let ray = Ray::new(point![1.0, 2.0, 3.0], vector![1.0, 1.0, 0.0]);
        assert!(close(sphere.hit(&ray, 0.0..).unwrap(), 2.0));
    }

    #[test]
    fn sphere_behind_or_beside_the_ray_is_missed() {
        let sphere = Sphere::new(point![0.0, 0.0, 5.0], 1.0);
        let behind = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0]);
        assert_eq!(sphere.hit(&behind, 0.0..), None);

        let beside = Ray::new(point![3.0, 0.0, 0.0], vector![0.0, 0.0, 1.0]);
        assert_eq!(sphere.hit(&beside, 0.0..), None);
    }

    #[test]
    fn tangent_ray_is_a_single_root_hit() {
        let sphere = Sphere::new(point![0.0, 1.0, -4.0], 1.0);
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0]);
        assert!(close(sphere.hit(&ray, 0.0..).unwrap(), 4.0));
    }

    #[test]
    fn plane_hit_distance_and_parallel_miss() {
        let plane = Plane::new(point![0.0, -1.0, 0.0], vector![0.0, 2.0, 0.0]).unwrap();
        assert!(close(plane.normal.norm(), 1.0));

        let down = Ray::new(Point3::origin(), vector![0.0, -1.0, 0.0]);
        assert!(close(plane.hit(&down, 0.0..).unwrap(), 1.0));

        let up = Ray::new(Point3::origin(), vector![0.0, 1.0, 0.0]);
        assert_eq!(plane.hit(&up, 0.0..), None);

        let parallel = Ray::new(Point3::origin(), vector![1.0, 0.0, -1.0]);
        assert_eq!(plane.hit(&parallel, 0.0..), None);
    }

    #[test]
    fn plane_is_hit_from_below_as_well() {
        let plane = Plane::new(point![0.0, -1.0, 0.0], vector![0.0, 1.0, 0.0]).unwrap();
        let ray = Ray::new(point![0.0, -3.0, 0.0], vector![0.0, 1.0, 0.0]);
        assert!(close(plane.hit(&ray, 0.0..).unwrap(), 2.0));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        assert_eq!(Plane::new(Point3::origin(), vector![0.0, 0.0, 0.0]), Err(ConfigError::DegenerateNormal));
        let flat = Primitive::sphere(Point3::origin(), 0.0, Color::WHITE);
        assert_eq!(Scene::new(vec![flat]), Err(ConfigError::InvalidRadius(0.0)));
        let negative = Primitive::sphere(Point3::origin(), -1.0, Color::WHITE);
        assert!(Scene::new(vec![negative]).is_err());
    }

    #[test]
    fn nearest_hit_wins_regardless_of_order() {
        let near = Primitive::sphere(point![0.0, 0.0, -3.0], 1.0, Color::RED);
        let far = Primitive::sphere(point![0.0, 0.0, -6.0], 2.5, Color::WHITE);
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0]);

        let forward = Scene::new(vec![near.clone(), far.clone()]).unwrap();
        let backward = Scene::new(vec![far, near]).unwrap();
        let a = forward.hit(&ray).unwrap();
        let b = backward.hit(&ray).unwrap();
        assert_eq!(a.color, Color::RED);
        assert_eq!(a, b);
        assert!(close(a.t, 2.0));
    }

    #[test]
    fn repeated_queries_are_bit_identical() {
        let scene = Scene::new(vec![
            Primitive::sphere(point![-1.0, 0.0, 0.0], 1.0, Color::WHITE),
            Primitive::plane(point![0.0, -1.0, 0.0], vector![0.0, 1.0, 0.0], Color::RED).unwrap(),
        ]).unwrap();
        let ray = Ray::new(point![0.0, 0.0, 10.0], vector![-0.3, -0.2, -1.0]);
        let first = scene.hit(&ray).unwrap();
        let second = scene.hit(&ray).unwrap();
        assert_eq!(first.t.to_bits(), second.t.to_bits());
        assert_eq!(first.color, second.color);
    }

    #[test]
    fn empty_scene_never_hits() {
        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0]);
        assert_eq!(Scene::default().hit(&ray), None);
    }
}
