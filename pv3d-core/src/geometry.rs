/// Geometry primitives for 3D rendering
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Apply a model matrix; normals go through `normal_matrix`
    pub fn transformed(&self, model: &Matrix4<f32>, normal_matrix: &Matrix3<f32>) -> Self {
        let map = |v: &Vertex| Vertex {
            position: model.transform_point(&v.position),
            normal: (normal_matrix * v.normal).normalize(),
        };
        Self {
            vertices: [
                map(&self.vertices[0]),
                map(&self.vertices[1]),
                map(&self.vertices[2]),
            ],
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a quad as two triangles. `u` and `v` are half-extents with
    /// `u × v` pointing along `normal`, so the winding is counter-clockwise
    /// when seen from the front.
    fn add_quad(&mut self, center: Vector3<f32>, u: Vector3<f32>, v: Vector3<f32>, normal: Vector3<f32>) {
        let corner = |su: f32, sv: f32| {
            let p = center + u * su + v * sv;
            Vertex::new(p.x, p.y, p.z, normal.x, normal.y, normal.z)
        };
        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        self.add_triangle(Triangle::new(a, b, c));
        self.add_triangle(Triangle::new(a, c, d));
    }

    /// Box centred on the origin with outward-facing normals
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        let x = Vector3::x();
        let y = Vector3::y();
        let z = Vector3::z();
        let mut mesh = Self::with_capacity(12);

        // Front / back
        mesh.add_quad(z * hd, x * hw, y * hh, z);
        mesh.add_quad(-z * hd, -x * hw, y * hh, -z);
        // Right / left
        mesh.add_quad(x * hw, -z * hd, y * hh, x);
        mesh.add_quad(-x * hw, z * hd, y * hh, -x);
        // Top / bottom
        mesh.add_quad(y * hh, x * hw, -z * hd, y);
        mesh.add_quad(-y * hh, x * hw, z * hd, -y);

        mesh
    }

    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Some(Aabb { min, max })
    }

    /// Copy of the mesh with every triangle moved into the frame of `model`
    pub fn transformed(&self, model: &Matrix4<f32>) -> Self {
        let normal_matrix = normal_matrix(model);
        Self {
            triangles: self
                .triangles
                .iter()
                .map(|t| t.transformed(model, &normal_matrix))
                .collect(),
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverse-transpose of the upper 3x3 block, falling back to the block itself
/// for degenerate matrices.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_extents() {
        let mesh = Mesh::cuboid(2.0, 2.5, 1.0);
        assert_eq!(mesh.triangles.len(), 12);

        let bounds = mesh.bounds().unwrap();
        let extents = bounds.extents();
        assert!((extents.x - 2.0).abs() < 1e-6);
        assert!((extents.y - 2.5).abs() < 1e-6);
        assert!((extents.z - 1.0).abs() < 1e-6);
        assert!(bounds.center().coords.norm() < 1e-6);
    }

    #[test]
    fn test_cuboid_winding_matches_normals() {
        let mesh = Mesh::cuboid(0.1, 2.0, 0.8);
        for triangle in &mesh.triangles {
            let geometric = triangle.calculate_normal();
            let declared = triangle.vertices[0].normal;
            assert!((geometric - declared).norm() < 1e-5);

            // Normals point away from the centre
            let centroid = triangle
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
                / 3.0;
            assert!(centroid.dot(&declared) > 0.0);
        }
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_transformed_moves_and_rotates() {
        let mesh = Mesh::cube(2.0);
        let model = Matrix4::new_translation(&Vector3::new(0.0, 3.0, 0.0))
            * Matrix4::new_rotation(Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let moved = mesh.transformed(&model);

        let bounds = moved.bounds().unwrap();
        assert!((bounds.center().y - 3.0).abs() < 1e-5);
        for triangle in &moved.triangles {
            let n = triangle.vertices[0].normal;
            assert!((n.norm() - 1.0).abs() < 1e-5);
            assert!((triangle.calculate_normal() - n).norm() < 1e-4);
        }
    }
}
