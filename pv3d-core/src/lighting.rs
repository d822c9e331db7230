/// Scene lighting: ambient, spot and point lights plus a hemisphere
/// environment preset, combined with a roughness/metalness shading model.
use std::fmt;
use std::str::FromStr;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::color::{Color, Material};
use crate::error::{Error, Result};

/// Uniform light applied to every surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Cone light aimed at `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub color: Color,
    /// Half-angle of the cone in radians
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..=1
    pub penumbra: f32,
    pub intensity: f32,
    pub cast_shadow: bool,
}

impl SpotLight {
    /// Cone attenuation for a surface point, three.js penumbra semantics
    pub fn cone_factor(&self, point: &Point3<f32>) -> f32 {
        let axis = self.target - self.position;
        let to_point = point - self.position;
        if axis.norm() < 1e-6 || to_point.norm() < 1e-6 {
            return 1.0;
        }
        let angle_cos = axis.normalize().dot(&to_point.normalize());
        let cone_cos = self.angle.cos();
        let penumbra_cos = (self.angle * (1.0 - self.penumbra)).cos();
        smoothstep(cone_cos, penumbra_cos, angle_cos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub color: Color,
    pub intensity: f32,
}

/// Image-based lighting stand-in: a sky/ground hemisphere per preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    #[default]
    City,
    Studio,
    Sunset,
    Night,
    Warehouse,
}

impl EnvironmentPreset {
    pub const ALL: [EnvironmentPreset; 5] = [
        EnvironmentPreset::City,
        EnvironmentPreset::Studio,
        EnvironmentPreset::Sunset,
        EnvironmentPreset::Night,
        EnvironmentPreset::Warehouse,
    ];

    /// (sky, ground, intensity)
    pub fn hemisphere(self) -> (Color, Color, f32) {
        match self {
            EnvironmentPreset::City => (
                Color::new(0.75, 0.80, 0.90),
                Color::new(0.30, 0.28, 0.27),
                0.9,
            ),
            EnvironmentPreset::Studio => (
                Color::new(0.95, 0.95, 0.95),
                Color::new(0.45, 0.45, 0.45),
                1.0,
            ),
            EnvironmentPreset::Sunset => (
                Color::new(1.00, 0.72, 0.50),
                Color::new(0.35, 0.22, 0.30),
                0.85,
            ),
            EnvironmentPreset::Night => (
                Color::new(0.25, 0.30, 0.50),
                Color::new(0.05, 0.05, 0.10),
                0.5,
            ),
            EnvironmentPreset::Warehouse => (
                Color::new(0.90, 0.85, 0.75),
                Color::new(0.35, 0.33, 0.30),
                0.9,
            ),
        }
    }

    /// Radiance arriving from `direction`
    pub fn radiance(self, direction: &Vector3<f32>) -> Color {
        let (sky, ground, intensity) = self.hemisphere();
        let t = direction.y * 0.5 + 0.5;
        ground.lerp(sky, t.clamp(0.0, 1.0)).scale(intensity)
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvironmentPreset::City => "city",
            EnvironmentPreset::Studio => "studio",
            EnvironmentPreset::Sunset => "sunset",
            EnvironmentPreset::Night => "night",
            EnvironmentPreset::Warehouse => "warehouse",
        }
    }
}

impl fmt::Display for EnvironmentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvironmentPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown environment preset {s:?}")))
    }
}

/// All light sources of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: AmbientLight,
    pub spot: SpotLight,
    pub point: PointLight,
    pub environment: EnvironmentPreset,
}

impl Lighting {
    /// Shade a surface point seen from `eye`
    pub fn shade(
        &self,
        material: &Material,
        position: &Point3<f32>,
        normal: &Vector3<f32>,
        eye: &Point3<f32>,
    ) -> Color {
        let n = normal.normalize();
        let v = (eye - position).normalize();
        let base = material.color;
        let diffuse_weight = 1.0 - material.metalness;
        let f0 = Color::new(0.04, 0.04, 0.04).lerp(base, material.metalness);
        let shininess = shininess(material.roughness);

        let ambient = base
            .modulate(self.ambient.color)
            .scale(self.ambient.intensity * diffuse_weight);

        // Environment: diffuse irradiance along the normal plus a blurred
        // reflection along the mirrored view direction.
        let reflected = n * (2.0 * n.dot(&v)) - v;
        let env_diffuse = base
            .modulate(self.environment.radiance(&n))
            .scale(diffuse_weight);
        let env_specular = f0
            .modulate(self.environment.radiance(&reflected))
            .scale(1.0 - 0.5 * material.roughness);

        let mut color = ambient.add(env_diffuse).add(env_specular);

        let spot = self.spot.color.scale(self.spot.intensity * self.spot.cone_factor(position));
        let spot_dir = (self.spot.position - position).normalize();
        color = color.add(direct(base, f0, diffuse_weight, shininess, &n, &v, &spot_dir, spot));

        let point = self.point.color.scale(self.point.intensity);
        let point_dir = (self.point.position - position).normalize();
        color = color.add(direct(base, f0, diffuse_weight, shininess, &n, &v, &point_dir, point));

        color.clamped()
    }
}

#[allow(clippy::too_many_arguments)]
fn direct(
    base: Color,
    f0: Color,
    diffuse_weight: f32,
    shininess: f32,
    n: &Vector3<f32>,
    v: &Vector3<f32>,
    l: &Vector3<f32>,
    radiance: Color,
) -> Color {
    let n_dot_l = n.dot(l);
    if n_dot_l <= 0.0 {
        return Color::BLACK;
    }
    let h = (l + v).normalize();
    let n_dot_h = n.dot(&h).max(0.0);
    let specular = n_dot_h.powf(shininess) * (shininess + 2.0) / 8.0;

    base.scale(diffuse_weight)
        .add(f0.scale(specular))
        .modulate(radiance)
        .scale(n_dot_l)
}

/// Blinn-Phong exponent for a roughness value
fn shininess(roughness: f32) -> f32 {
    let r4 = roughness.max(0.05).powi(4);
    (2.0 / r4 - 2.0).clamp(1.0, 256.0)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if (edge1 - edge0).abs() < 1e-9 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
