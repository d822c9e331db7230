/// Ray casting against triangles for pointer hover and click detection
use nalgebra::{Point3, Vector3};

use crate::geometry::Triangle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Möller–Trumbore intersection. Both faces count as hits.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let v0 = triangle.vertices[0].position;
    let edge1 = triangle.vertices[1].position - v0;
    let edge2 = triangle.vertices[2].position - v0;

    let p = ray.direction.cross(&edge2);
    let det = edge1.dot(&p);
    if det.abs() < EPSILON {
        return None; // parallel
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - v0;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Nearest hit among `triangles`
pub fn pick<'a, I>(ray: &Ray, triangles: I) -> Option<Hit>
where
    I: IntoIterator<Item = &'a Triangle>,
{
    triangles
        .into_iter()
        .filter_map(|t| intersect_triangle(ray, t))
        .min_by(|a, b| a.total_cmp(b))
        .map(|distance| Hit {
            distance,
            point: ray.at(distance),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Vertex};

    fn forward_ray(x: f32, y: f32) -> Ray {
        Ray::new(Point3::new(x, y, 5.0), Vector3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_hits_front_face_first() {
        let mesh = Mesh::cuboid(2.0, 2.5, 1.0);
        let hit = pick(&forward_ray(0.0, 0.0), &mesh.triangles).unwrap();
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.point.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_miss_outside_box() {
        let mesh = Mesh::cuboid(2.0, 2.5, 1.0);
        assert!(pick(&forward_ray(1.5, 0.0), &mesh.triangles).is_none());
        assert!(pick(&forward_ray(0.0, 1.3), &mesh.triangles).is_none());
    }

    #[test]
    fn test_ignores_triangles_behind_origin() {
        let mesh = Mesh::cube(1.0);
        let away = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(pick(&away, &mesh.triangles).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let floor = Triangle::new(
            Vertex::new(-2.0, 0.0, 2.0, 0.0, 1.0, 0.0),
            Vertex::new(2.0, 0.0, 2.0, 0.0, 1.0, 0.0),
            Vertex::new(0.0, 0.0, -2.0, 0.0, 1.0, 0.0),
        );
        let grazing = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(pick(&grazing, &[floor]).is_none());
    }
}
