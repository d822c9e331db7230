/// Software rasterizer with a color and depth buffer
use crate::color::Color;
use crate::error::{Error, Result};
use crate::projection::ScreenPoint;

/// Perspective-corrected barycentric weights of a covered pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    pub weights: [f32; 3],
    pub depth: f32,
}

impl Fragment {
    pub fn interpolate<T>(&self, a: T, b: T, c: T) -> T
    where
        T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        a * self.weights[0] + b * self.weights[1] + c * self.weights[2]
    }
}

pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyViewport { width, height });
        }
        let size = width * height;
        Ok(Self {
            width,
            height,
            color: vec![Color::BLACK; size],
            depth: vec![f32::INFINITY; size],
        })
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyViewport { width, height });
        }
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height)?;
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.color[y * self.width + x]
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth[y * self.width + x]
    }

    /// Fill with a top-left to bottom-right gradient through `stops` and reset
    /// the depth buffer.
    pub fn clear_gradient(&mut self, stops: &[Color]) {
        let last = self.width.max(2) - 1 + self.height.max(2) - 1;
        for y in 0..self.height {
            for x in 0..self.width {
                let t = (x + y) as f32 / last as f32;
                self.color[y * self.width + x] = gradient_at(stops, t);
            }
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Depth-tested triangle fill; `shader` computes the color of each
    /// fragment that passes.
    pub fn draw_triangle<F>(&mut self, vertices: &[ScreenPoint; 3], mut shader: F)
    where
        F: FnMut(&Fragment) -> Color,
    {
        let width = self.width;
        let mut covered = Vec::new();
        self.rasterize(vertices, |fragment| covered.push(*fragment));
        for fragment in covered {
            let idx = fragment.y * width + fragment.x;
            if fragment.depth < self.depth[idx] {
                self.depth[idx] = fragment.depth;
                self.color[idx] = shader(&fragment);
            }
        }
    }

    /// Alpha-blended fill that respects but does not write depth
    pub fn blend_triangle(&mut self, vertices: &[ScreenPoint; 3], color: Color, alpha: f32) {
        let width = self.width;
        let mut covered = Vec::new();
        self.rasterize(vertices, |fragment| covered.push(*fragment));
        for fragment in covered {
            let idx = fragment.y * width + fragment.x;
            if fragment.depth <= self.depth[idx] {
                self.color[idx] = self.color[idx].lerp(color, alpha);
            }
        }
    }

    /// Visit every pixel center covered by the triangle
    fn rasterize<F>(&self, vertices: &[ScreenPoint; 3], mut emit: F)
    where
        F: FnMut(&Fragment),
    {
        let [v0, v1, v2] = vertices;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i64;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i64;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i64;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i64;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i64 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p)
                else {
                    return; // degenerate triangle
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Screen-space depth, perspective-correct attribute weights
                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let (p0, p1, p2) = (w0 * v0.inv_w, w1 * v1.inv_w, w2 * v2.inv_w);
                let sum = p0 + p1 + p2;
                let weights = if sum.abs() > 1e-12 {
                    [p0 / sum, p1 / sum, p2 / sum]
                } else {
                    [w0, w1, w2]
                };

                emit(&Fragment {
                    x: x as usize,
                    y: y as usize,
                    weights,
                    depth,
                });
            }
        }
    }

    /// Packed RGBA bytes, row-major
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.color.len() * 4);
        for c in &self.color {
            let [r, g, b] = c.to_rgb8();
            bytes.extend_from_slice(&[r, g, b, 255]);
        }
        bytes
    }
}

/// Calculate barycentric coordinates for a point in a triangle
pub fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

fn gradient_at(stops: &[Color], t: f32) -> Color {
    match stops {
        [] => Color::BLACK,
        [only] => *only,
        _ => {
            let span = (stops.len() - 1) as f32;
            let scaled = t.clamp(0.0, 1.0) * span;
            let i = (scaled.floor() as usize).min(stops.len() - 2);
            stops[i].lerp(stops[i + 1], scaled - i as f32)
        }
    }
}
