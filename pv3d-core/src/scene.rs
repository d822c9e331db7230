/// Scene graph: named nodes with local poses, meshes, text labels and groups.
use nalgebra::{Matrix4, Point3};

use crate::color::{palette, Color, Material};
use crate::config::{ProductConfig, ViewerConfig};
use crate::error::Result;
use crate::geometry::{Mesh, Triangle};
use crate::lighting::{AmbientLight, Lighting, PointLight, SpotLight};
use crate::shadow::ContactShadows;
use crate::transform::Pose;

pub const PRODUCT: &str = "product";
pub const BODY: &str = "body";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorX {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Top,
    Middle,
    Bottom,
}

/// Flat text drawn in the node's local XY plane, facing +Z
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub anchor_x: AnchorX,
    pub anchor_y: AnchorY,
    pub bold: bool,
}

impl TextLabel {
    pub fn new(text: impl Into<String>, font_size: f32, color: Color) -> Self {
        Self {
            text: text.into(),
            font_size,
            color,
            anchor_x: AnchorX::Center,
            anchor_y: AnchorY::Middle,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh { mesh: Mesh, material: Material },
    Text(TextLabel),
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub pose: Pose,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh, material: Material) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            kind: NodeKind::Mesh { mesh, material },
            children: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: TextLabel) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            kind: NodeKind::Text(label),
            children: Vec::new(),
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    /// Depth-first walk handing each node its world matrix
    pub fn visit<F>(&self, parent: &Matrix4<f32>, f: &mut F)
    where
        F: FnMut(&SceneNode, &Matrix4<f32>),
    {
        let world = parent * self.pose.matrix();
        f(self, &world);
        for child in &self.children {
            child.visit(&world, f);
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    /// World-space triangles of every mesh under this node
    pub fn world_triangles(&self) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        self.visit(&Matrix4::identity(), &mut |node, world| {
            if let NodeKind::Mesh { mesh, .. } = &node.kind {
                triangles.extend(mesh.transformed(world).triangles);
            }
        });
        triangles
    }
}

/// Colors of the product body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyColors {
    pub idle: Color,
    pub hovered: Color,
}

impl BodyColors {
    pub fn from_config(config: &ProductConfig) -> Result<Self> {
        Ok(Self {
            idle: Color::from_hex(&config.body_color)?,
            hovered: Color::from_hex(&config.hover_color)?,
        })
    }
}

/// Everything that gets drawn
#[derive(Debug, Clone)]
pub struct Scene {
    pub product: SceneNode,
    pub body_colors: BodyColors,
    pub lighting: Lighting,
    pub shadows: Option<ContactShadows>,
}

impl Scene {
    /// The branded box: a glossy body with two labels and dark side panels
    pub fn product_showcase(config: &ViewerConfig) -> Result<Self> {
        let body_colors = BodyColors::from_config(&config.product)?;

        let body = SceneNode::mesh(
            BODY,
            Mesh::cuboid(2.0, 2.5, 1.0),
            Material::new(body_colors.idle, 0.1, 0.8),
        );
        let title = SceneNode::text(
            "label-premium",
            TextLabel::new("PREMIUM", 0.3, Color::WHITE).bold(),
        )
        .with_pose(Pose::at(0.0, 0.0, 0.51));
        let subtitle = SceneNode::text(
            "label-product",
            TextLabel::new("PRODUCT", 0.2, palette::GRAY_200),
        )
        .with_pose(Pose::at(0.0, -0.4, 0.51));

        let panel_color = Color::from_hex(&config.product.panel_color)?;
        let panel_material = Material::new(panel_color, 0.8, 0.0);
        let right_panel = SceneNode::mesh("panel-right", Mesh::cuboid(0.1, 2.0, 0.8), panel_material)
            .with_pose(Pose::at(1.05, 0.0, 0.0));
        let left_panel = SceneNode::mesh("panel-left", Mesh::cuboid(0.1, 2.0, 0.8), panel_material)
            .with_pose(Pose::at(-1.05, 0.0, 0.0));

        let product = SceneNode::group(PRODUCT)
            .with_child(body)
            .with_child(title)
            .with_child(subtitle)
            .with_child(right_panel)
            .with_child(left_panel);

        let l = &config.lighting;
        let lighting = Lighting {
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: l.ambient_intensity,
            },
            spot: SpotLight {
                position: Point3::from(l.spot_position),
                target: Point3::origin(),
                color: Color::WHITE,
                angle: l.spot_angle,
                penumbra: l.spot_penumbra,
                intensity: l.spot_intensity,
                cast_shadow: true,
            },
            point: PointLight {
                position: Point3::from(l.point_position),
                color: Color::WHITE,
                intensity: l.point_intensity,
            },
            environment: config.environment,
        };

        let shadows = config
            .shadows
            .enabled
            .then(|| ContactShadows::from_config(&config.shadows));

        Ok(Self {
            product,
            body_colors,
            lighting,
            shadows,
        })
    }

    /// Product triangles in world space, used for picking and shadows
    pub fn product_triangles(&self) -> Vec<Triangle> {
        self.product.world_triangles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_showcase_layout() {
        let scene = Scene::product_showcase(&ViewerConfig::default()).unwrap();
        let product = &scene.product;
        assert_eq!(product.name, PRODUCT);
        assert_eq!(product.children.len(), 5);

        let body = product.find(BODY).unwrap();
        match &body.kind {
            NodeKind::Mesh { material, .. } => {
                assert_eq!(material.color.to_css(), "#6366f1");
                assert!((material.roughness - 0.1).abs() < 1e-6);
                assert!((material.metalness - 0.8).abs() < 1e-6);
            }
            other => panic!("body should be a mesh, got {other:?}"),
        }

        let premium = product.find("label-premium").unwrap();
        assert!((premium.pose.position.z - 0.51).abs() < 1e-6);
        match &premium.kind {
            NodeKind::Text(label) => {
                assert_eq!(label.text, "PREMIUM");
                assert!(label.bold);
                assert_eq!(label.anchor_x, AnchorX::Center);
                assert_eq!(label.anchor_y, AnchorY::Middle);
            }
            other => panic!("expected text, got {other:?}"),
        }

        let left = product.find("panel-left").unwrap();
        assert!((left.pose.position.x + 1.05).abs() < 1e-6);
    }

    fn world_origins(node: &SceneNode) -> Vec<(String, Point3<f32>)> {
        let mut origins = Vec::new();
        node.visit(&Matrix4::identity(), &mut |node, world| {
            origins.push((node.name.clone(), world.transform_point(&Point3::origin())));
        });
        origins
    }

    #[test]
    fn test_world_triangles_follow_body_pose() {
        let mut scene = Scene::product_showcase(&ViewerConfig::default()).unwrap();
        let flat = scene.product_triangles();
        // body + two panels, text has no geometry
        assert_eq!(flat.len(), 36);
        let before = world_origins(&scene.product);

        scene.product.find_mut(BODY).unwrap().pose.position.y = 0.2;
        let lifted = scene.product_triangles();
        let max_y = |ts: &[Triangle]| {
            ts.iter()
                .flat_map(|t| t.vertices.iter().map(|v| v.position.y))
                .fold(f32::MIN, f32::max)
        };
        assert!((max_y(&flat) - 1.25).abs() < 1e-5);
        assert!((max_y(&lifted) - 1.45).abs() < 1e-5);

        // Body triangles come first, the panels keep their 1.0 half height
        assert!((max_y(&lifted[12..]) - 1.0).abs() < 1e-5);

        let after = world_origins(&scene.product);
        for ((name, was), (_, now)) in before.iter().zip(&after) {
            if name == BODY {
                assert!((now.y - 0.2).abs() < 1e-6);
            } else {
                assert!((now - was).norm() < 1e-6, "{name} moved");
            }
        }
    }

    #[test]
    fn test_find_mut_reaches_nested_nodes() {
        let mut root = SceneNode::group("root").with_child(
            SceneNode::group("inner").with_child(SceneNode::mesh(
                "leaf",
                Mesh::cube(1.0),
                Material::default(),
            )),
        );
        root.find_mut("leaf")
            .and_then(SceneNode::material_mut)
            .unwrap()
            .color = Color::BLACK;
        assert!(root.find("missing").is_none());
        match &root.find("leaf").unwrap().kind {
            NodeKind::Mesh { material, .. } => assert_eq!(material.color, Color::BLACK),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_visit_accumulates_parent_transforms() {
        let root = SceneNode::group("root")
            .with_pose(Pose::at(1.0, 0.0, 0.0))
            .with_child(SceneNode::group("child").with_pose(Pose::at(0.0, 2.0, 0.0)));

        let mut seen = Vec::new();
        root.visit(&Matrix4::identity(), &mut |node, world| {
            seen.push((node.name.clone(), world.transform_point(&Point3::origin())));
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0, "child");
        assert!((seen[1].1 - Point3::new(1.0, 2.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_shadows_can_be_disabled() {
        let mut config = ViewerConfig::default();
        config.shadows.enabled = false;
        assert!(Scene::product_showcase(&config).unwrap().shadows.is_none());
    }
}
