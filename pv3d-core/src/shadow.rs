/// Contact shadows: a soft darkening on a horizontal catcher plane below the
/// product, baked from a top-down view of the geometry.
use crate::config::ShadowConfig;
use crate::geometry::Triangle;
use crate::raster::barycentric;

/// World units of blur radius per unit of `blur`
const BLUR_UNIT: f32 = 0.2;
const EMPTY_CELL: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct ContactShadows {
    /// Height of the catcher plane
    pub position_y: f32,
    pub opacity: f32,
    /// Side length of the square catcher
    pub scale: f32,
    pub blur: f32,
    /// Geometry further than this above the plane casts nothing
    pub far: f32,
    pub resolution: usize,
}

impl ContactShadows {
    pub fn from_config(config: &ShadowConfig) -> Self {
        Self {
            position_y: config.position_y,
            opacity: config.opacity,
            scale: config.scale,
            blur: config.blur,
            far: config.far,
            resolution: config.resolution.max(1),
        }
    }

    fn cell_size(&self) -> f32 {
        self.scale / self.resolution as f32
    }

    pub fn blur_radius_cells(&self) -> usize {
        (self.blur * BLUR_UNIT / self.cell_size()).round() as usize
    }

    /// Rasterize world-space triangles into a shadow map
    pub fn bake(&self, triangles: &[Triangle]) -> ShadowMap {
        let res = self.resolution;
        let half = self.scale / 2.0;
        let cell = self.cell_size();
        let mut values = vec![0.0f32; res * res];

        for triangle in triangles {
            let mut grid = [(0.0f32, 0.0f32); 3];
            let mut strength = [0.0f32; 3];
            let mut in_range = false;
            for (k, vertex) in triangle.vertices.iter().enumerate() {
                let p = vertex.position;
                let height = p.y - self.position_y;
                grid[k] = ((p.x + half) / cell, (p.z + half) / cell);
                strength[k] = (1.0 - height / self.far).clamp(0.0, 1.0);
                in_range |= (0.0..=self.far).contains(&height);
            }
            if !in_range {
                continue;
            }

            let min_x = grid.iter().map(|g| g.0).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
            let max_x = grid.iter().map(|g| g.0).fold(f32::MIN, f32::max).ceil();
            let min_z = grid.iter().map(|g| g.1).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
            let max_z = grid.iter().map(|g| g.1).fold(f32::MIN, f32::max).ceil();
            if max_x < 0.0 || max_z < 0.0 {
                continue;
            }
            let max_x = (max_x as usize).min(res - 1);
            let max_z = (max_z as usize).min(res - 1);

            for z in min_z..=max_z {
                for x in min_x..=max_x {
                    let p = (x as f32 + 0.5, z as f32 + 0.5);
                    // Vertical faces project to lines and yield no weights
                    if let Some((w0, w1, w2)) = barycentric(grid[0], grid[1], grid[2], p) {
                        if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                            let s = w0 * strength[0] + w1 * strength[1] + w2 * strength[2];
                            let idx = z * res + x;
                            values[idx] = values[idx].max(s);
                        }
                    }
                }
            }
        }

        let radius = self.blur_radius_cells();
        if radius > 0 {
            box_blur(&mut values, res, radius);
        }
        for v in &mut values {
            *v *= self.opacity;
        }

        ShadowMap {
            resolution: res,
            scale: self.scale,
            position_y: self.position_y,
            values,
        }
    }
}

/// One square of the catcher plane with its darkness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCell {
    pub x0: f32,
    pub z0: f32,
    pub x1: f32,
    pub z1: f32,
    pub darkness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowMap {
    pub resolution: usize,
    pub scale: f32,
    pub position_y: f32,
    values: Vec<f32>,
}

impl ShadowMap {
    /// Cells dark enough to be worth drawing
    pub fn cells(&self) -> impl Iterator<Item = ShadowCell> + '_ {
        let res = self.resolution;
        let cell = self.scale / res as f32;
        let half = self.scale / 2.0;
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > EMPTY_CELL)
            .map(move |(idx, v)| {
                let (x, z) = ((idx % res) as f32, (idx / res) as f32);
                ShadowCell {
                    x0: -half + x * cell,
                    z0: -half + z * cell,
                    x1: -half + (x + 1.0) * cell,
                    z1: -half + (z + 1.0) * cell,
                    darkness: *v,
                }
            })
    }
}

/// Separable box blur with clamped edges
fn box_blur(values: &mut [f32], res: usize, radius: usize) {
    let mut scratch = vec![0.0f32; values.len()];
    let window = (2 * radius + 1) as f32;

    for row in 0..res {
        for col in 0..res {
            let mut sum = 0.0;
            for k in col.saturating_sub(radius)..=(col + radius).min(res - 1) {
                sum += values[row * res + k];
            }
            scratch[row * res + col] = sum / window;
        }
    }
    for col in 0..res {
        for row in 0..res {
            let mut sum = 0.0;
            for k in row.saturating_sub(radius)..=(row + radius).min(res - 1) {
                sum += scratch[k * res + col];
            }
            values[row * res + col] = sum / window;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use nalgebra::{Matrix4, Vector3};

    fn catcher() -> ContactShadows {
        ContactShadows::from_config(&ShadowConfig::default())
    }

    fn box_at(y: f32) -> Vec<Triangle> {
        Mesh::cuboid(2.0, 2.5, 1.0)
            .transformed(&Matrix4::new_translation(&Vector3::new(0.0, y, 0.0)))
            .triangles
    }

    /// Darkness of the drawn cell covering a world XZ position
    fn darkness_at(map: &ShadowMap, x: f32, z: f32) -> f32 {
        map.cells()
            .find(|c| (c.x0..c.x1).contains(&x) && (c.z0..c.z1).contains(&z))
            .map_or(0.0, |c| c.darkness)
    }

    #[test]
    fn test_default_blur_radius() {
        assert_eq!(catcher().blur_radius_cells(), 2);
    }

    #[test]
    fn test_shadow_under_product_only() {
        let map = catcher().bake(&box_at(0.0));
        let under = darkness_at(&map, 0.0, 0.0);
        assert!(under > 0.0);
        assert!(under <= 0.4 + 1e-6);
        assert_eq!(darkness_at(&map, 4.0, 4.0), 0.0);
        assert_eq!(darkness_at(&map, 20.0, 0.0), 0.0);
    }

    #[test]
    fn test_lifting_lightens_shadow() {
        let shadows = catcher();
        let low = darkness_at(&shadows.bake(&box_at(0.0)), 0.0, 0.0);
        let high = darkness_at(&shadows.bake(&box_at(0.2)), 0.0, 0.0);
        assert!(high < low);
    }

    #[test]
    fn test_out_of_range_geometry_casts_nothing() {
        let shadows = catcher();
        assert_eq!(shadows.bake(&box_at(10.0)).cells().count(), 0);
        assert_eq!(shadows.bake(&box_at(-5.0)).cells().count(), 0);
    }

    #[test]
    fn test_cells_cover_shadow() {
        let map = catcher().bake(&box_at(0.0));
        let cells: Vec<_> = map.cells().collect();
        assert!(!cells.is_empty());
        for cell in &cells {
            assert!(cell.x1 > cell.x0 && cell.z1 > cell.z0);
            assert!(cell.x0 >= -5.0 - 1e-4 && cell.x1 <= 5.0 + 1e-4);
            assert!(cell.darkness > 0.0);
        }
    }
}
