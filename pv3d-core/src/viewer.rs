/// The product viewer: scene, camera, controls and interaction state behind a
/// small event-driven API that terminal and browser hosts feed with pointer
/// input and frame ticks.
use nalgebra::{Matrix4, Point3, Vector3};

use crate::animation::ProductAnimator;
use crate::color::{palette, Color};
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::error::Result;
use crate::geometry::{normal_matrix, Triangle};
use crate::overlay::Overlay;
use crate::picking::{pick, Ray};
use crate::projection::{project_with, Camera, ScreenPoint};
use crate::raster::Framebuffer;
use crate::scene::{AnchorX, AnchorY, NodeKind, Scene};
use crate::shadow::ShadowMap;
use crate::state::ViewerState;

/// Movement in pixels before a press turns into a drag
const DRAG_THRESHOLD: f32 = 3.0;

/// Page background, top-left to bottom-right
pub const BACKGROUND: [Color; 3] = [palette::SLATE_900, palette::PURPLE_900, palette::SLATE_900];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: PointerButton,
    origin: (f32, f32),
    last: (f32, f32),
    dragging: bool,
}

/// A product label placed on screen for the host to draw as text
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Glyph height in pixels
    pub size_px: f32,
    pub color: Color,
    pub bold: bool,
    pub anchor_x: AnchorX,
    pub anchor_y: AnchorY,
}

pub struct ProductViewer {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    state: ViewerState,
    animator: ProductAnimator,
    width: u32,
    height: u32,
    pointer: Option<(f32, f32)>,
    press: Option<Press>,
}

impl ProductViewer {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;

        let (width, height) = (800, 600);
        let mut camera = Camera::new(width, height);
        camera.position = Point3::from(config.camera.position);
        camera.fov = config.camera.fov_degrees.to_radians();

        let state = ViewerState::new();
        let mut controls = OrbitControls::from_camera(&camera, &config.controls);
        controls.auto_rotate = state.orbit_auto_rotate();
        controls.apply(&mut camera);

        let scene = Scene::product_showcase(&config)?;
        let animator = ProductAnimator::from_config(&config.animation);
        log::info!(
            "product viewer ready (environment: {}, shadows: {})",
            config.environment,
            scene.shadows.is_some()
        );

        Ok(Self {
            config,
            scene,
            camera,
            controls,
            state,
            animator,
            width,
            height,
            pointer: None,
            press: None,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn overlay(&self) -> Overlay {
        Overlay::for_state(&self.state)
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("viewport resized to {width}x{height}");
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Some((x, y));

        if let Some(press) = self.press.as_mut() {
            let (dx, dy) = (x - press.last.0, y - press.last.1);
            press.last = (x, y);

            if !press.dragging {
                let (ox, oy) = (x - press.origin.0, y - press.origin.1);
                if (ox * ox + oy * oy).sqrt() > DRAG_THRESHOLD {
                    press.dragging = true;
                    self.controls.set_dragging(true);
                }
            }
            if press.dragging {
                let height = self.height as f32;
                match press.button {
                    PointerButton::Primary => self.controls.rotate_by_pixels(dx, dy, height),
                    PointerButton::Secondary => {
                        self.controls.pan(dx, dy, height, self.camera.fov)
                    }
                }
                self.controls.apply(&mut self.camera);
            }
        }

        self.update_hover();
    }

    pub fn pointer_pressed(&mut self, x: f32, y: f32, button: PointerButton) {
        self.pointer = Some((x, y));
        self.press = Some(Press {
            button,
            origin: (x, y),
            last: (x, y),
            dragging: false,
        });
    }

    /// Returns true when the release was a click on the product
    pub fn pointer_released(&mut self, x: f32, y: f32, button: PointerButton) -> bool {
        self.pointer = Some((x, y));
        self.controls.set_dragging(false);

        let Some(press) = self.press.take() else {
            return false;
        };
        if press.dragging || press.button != button || button != PointerButton::Primary {
            return false;
        }
        if self.hit_test(x, y) {
            self.state.click();
            true
        } else {
            false
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.press = None;
        self.controls.set_dragging(false);
        if self.state.pointer_out() {
            log::debug!("pointer left the product");
        }
    }

    /// Positive steps zoom in
    pub fn wheel(&mut self, steps: f32) {
        self.controls.dolly(steps);
        self.controls.apply(&mut self.camera);
    }

    pub fn orbit_by_pixels(&mut self, dx: f32, dy: f32) {
        self.controls.rotate_by_pixels(dx, dy, self.height as f32);
        self.controls.apply(&mut self.camera);
    }

    pub fn reset_view(&mut self) {
        self.controls.reset();
        self.controls.apply(&mut self.camera);
    }

    /// Flip the rotation toggle and return the new button label
    pub fn toggle_auto_rotate(&mut self) -> &'static str {
        self.state.toggle_auto_rotate();
        self.controls.auto_rotate = self.state.orbit_auto_rotate();
        self.state.toggle_label()
    }

    /// Toggle `clicked` as if the product had been clicked
    pub fn click_product(&mut self) {
        self.state.click();
    }

    /// Whether the pixel lies over the product
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        self.pick_ray(x, y)
            .map(|ray| pick(&ray, &self.scene.product_triangles()).is_some())
            .unwrap_or(false)
    }

    fn pick_ray(&self, x: f32, y: f32) -> Option<Ray> {
        self.camera.screen_ray(x, y, self.width, self.height)
    }

    fn update_hover(&mut self) {
        let over = match self.pointer {
            Some((x, y)) => self.hit_test(x, y),
            None => false,
        };
        if over {
            if self.state.pointer_over() {
                log::debug!("pointer entered the product");
            }
        } else if self.state.pointer_out() {
            log::debug!("pointer left the product");
        }
    }

    /// Advance animation and controls by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.animator
            .step(&self.state, &self.scene.body_colors, &mut self.scene.product, dt);
        self.controls.auto_rotate = self.state.orbit_auto_rotate();
        self.controls.update(dt);
        self.controls.apply(&mut self.camera);
        self.update_hover();
    }

    /// Draw the scene and return the labels for the host to print
    pub fn render(&mut self, framebuffer: &mut Framebuffer) -> Vec<ProjectedLabel> {
        let (width, height) = (framebuffer.width() as u32, framebuffer.height() as u32);
        self.resize(width, height);

        framebuffer.clear_gradient(&BACKGROUND);

        let view_projection = self.camera.view_projection();
        let eye = self.camera.position;
        let lighting = &self.scene.lighting;

        self.scene.product.visit(&Matrix4::identity(), &mut |node, world| {
            let NodeKind::Mesh { mesh, material } = &node.kind else {
                return;
            };
            let normals = normal_matrix(world);
            for triangle in &mesh.triangles {
                let t = triangle.transformed(world, &normals);
                let [a, b, c] = &t.vertices;

                // Closed meshes: faces turned away are hidden anyway
                if (eye - a.position).dot(&t.calculate_normal()) <= 0.0 {
                    continue;
                }
                let Some(screen) = project_triangle(&view_projection, &t, width, height) else {
                    continue;
                };
                framebuffer.draw_triangle(&screen, |fragment| {
                    let position =
                        fragment.interpolate(a.position.coords, b.position.coords, c.position.coords);
                    let normal = fragment.interpolate(a.normal, b.normal, c.normal);
                    lighting.shade(material, &Point3::from(position), &normal, &eye)
                });
            }
        });

        let triangles = self.scene.product_triangles();
        if let Some(shadows) = &self.scene.shadows {
            // The catcher is single-sided
            if eye.y > shadows.position_y {
                let map = shadows.bake(&triangles);
                draw_shadow(framebuffer, &map, &view_projection, width, height);
            }
        }

        self.project_labels(&triangles)
    }

    fn project_labels(&self, occluders: &[Triangle]) -> Vec<ProjectedLabel> {
        let eye = self.camera.position;
        let (width, height) = (self.width, self.height);
        let mut labels = Vec::new();

        self.scene.product.visit(&Matrix4::identity(), &mut |node, world| {
            let NodeKind::Text(label) = &node.kind else {
                return;
            };
            let anchor = world.transform_point(&Point3::origin());
            let facing = (normal_matrix(world) * Vector3::z()).normalize();
            let to_eye = eye - anchor;
            if facing.dot(&to_eye) <= 0.0 {
                return;
            }

            // Hidden when the product sits between the eye and the label
            let distance = to_eye.norm();
            let ray = Ray::new(eye, -to_eye / distance);
            if let Some(hit) = pick(&ray, occluders) {
                if hit.distance < distance - 1e-3 {
                    return;
                }
            }

            let top = Point3::new(0.0, label.font_size, 0.0);
            let (Some(at), Some(up)) = (
                self.camera.project_to_screen(&Point3::origin(), world, width, height),
                self.camera.project_to_screen(&top, world, width, height),
            ) else {
                return;
            };
            let size_px = ((up.x - at.x).powi(2) + (up.y - at.y).powi(2)).sqrt();

            labels.push(ProjectedLabel {
                text: label.text.clone(),
                x: at.x,
                y: at.y,
                size_px,
                color: label.color,
                bold: label.bold,
                anchor_x: label.anchor_x,
                anchor_y: label.anchor_y,
            });
        });

        labels
    }
}

fn project_triangle(
    view_projection: &Matrix4<f32>,
    triangle: &Triangle,
    width: u32,
    height: u32,
) -> Option<[ScreenPoint; 3]> {
    let [a, b, c] = &triangle.vertices;
    Some([
        project_with(view_projection, &a.position, width, height)?,
        project_with(view_projection, &b.position, width, height)?,
        project_with(view_projection, &c.position, width, height)?,
    ])
}

fn draw_shadow(
    framebuffer: &mut Framebuffer,
    map: &ShadowMap,
    view_projection: &Matrix4<f32>,
    width: u32,
    height: u32,
) {
    let y = map.position_y;
    for cell in map.cells() {
        let corners = [
            Point3::new(cell.x0, y, cell.z0),
            Point3::new(cell.x1, y, cell.z0),
            Point3::new(cell.x1, y, cell.z1),
            Point3::new(cell.x0, y, cell.z1),
        ];
        let projected: Option<Vec<ScreenPoint>> = corners
            .iter()
            .map(|p| project_with(view_projection, p, width, height))
            .collect();
        let Some(p) = projected else {
            continue;
        };
        framebuffer.blend_triangle(&[p[0], p[1], p[2]], Color::BLACK, cell.darkness);
        framebuffer.blend_triangle(&[p[0], p[2], p[3]], Color::BLACK, cell.darkness);
    }
}
