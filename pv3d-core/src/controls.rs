/// Orbit camera controls: drag to rotate around a target, wheel to dolly,
/// optional panning and a slow automatic turntable rotation.
use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};

use crate::config::ControlsConfig;
use crate::projection::Camera;

/// Keeps the camera off the poles where `look_at` degenerates
const POLE_EPSILON: f32 = 1e-6;

/// Dolly factor per wheel step
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    /// Distance from the target
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X
    pub theta: f32,
    /// Polar angle from +Y
    pub phi: f32,

    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,

    dragging: bool,
    home: (Point3<f32>, f32, f32, f32),
}

impl OrbitControls {
    pub fn from_camera(camera: &Camera, config: &ControlsConfig) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.norm().max(f32::EPSILON);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let mut controls = Self {
            target: camera.target,
            radius,
            theta,
            phi,
            enable_pan: config.enable_pan,
            enable_zoom: config.enable_zoom,
            enable_rotate: config.enable_rotate,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            auto_rotate: true,
            auto_rotate_speed: config.auto_rotate_speed,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            dragging: false,
            home: (camera.target, radius, theta, phi),
        };
        controls.clamp();
        controls.home = (controls.target, controls.radius, controls.theta, controls.phi);
        controls
    }

    /// Suspends auto-rotation while the user is dragging
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Dragging across the full viewport height turns a full circle
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        let per_pixel = TAU / viewport_height * self.rotate_speed;
        self.rotate_left(dx * per_pixel);
        self.rotate_up(dy * per_pixel);
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.theta -= angle;
        self.clamp();
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi -= angle;
        self.clamp();
    }

    /// Positive steps move the camera closer
    pub fn dolly(&mut self, steps: f32) {
        if !self.enable_zoom {
            return;
        }
        self.radius *= ZOOM_BASE.powf(steps * self.zoom_speed);
        self.clamp();
    }

    /// Slide the target in the view plane
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, fov: f32) {
        if !self.enable_pan || viewport_height <= 0.0 {
            return;
        }
        let units_per_pixel = 2.0 * self.radius * (fov / 2.0).tan() / viewport_height;
        let offset = self.offset();
        let forward = -offset.normalize();
        let right = forward.cross(&Vector3::y()).normalize();
        let up = right.cross(&forward);
        self.target += (-right * dx + up * dy) * units_per_pixel;
    }

    /// Advance auto-rotation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.auto_rotate && !self.dragging {
            self.rotate_left(self.auto_rotation_angle(dt));
        }
    }

    /// A speed of 1 turns once a minute
    pub fn auto_rotation_angle(&self, dt: f32) -> f32 {
        TAU / 60.0 * self.auto_rotate_speed * dt
    }

    pub fn offset(&self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }

    pub fn apply(&self, camera: &mut Camera) {
        camera.target = self.target;
        camera.position = self.target + self.offset();
    }

    pub fn reset(&mut self) {
        let (target, radius, theta, phi) = self.home;
        self.target = target;
        self.radius = radius;
        self.theta = theta;
        self.phi = phi;
        self.dragging = false;
    }

    fn clamp(&mut self) {
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.theta = self.theta.rem_euclid(TAU);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::from_camera(&Camera::new(800, 600), &ControlsConfig::default())
    }

    #[test]
    fn test_starts_from_camera_position() {
        let c = controls();
        assert!((c.radius - 5.0).abs() < 1e-6);
        assert!(c.theta.abs() < 1e-6);
        assert!((c.phi - PI / 2.0).abs() < 1e-6);

        let mut camera = Camera::new(800, 600);
        c.apply(&mut camera);
        assert!((camera.position - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-5);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut c = controls();
        c.dolly(100.0);
        assert!((c.radius - 3.0).abs() < 1e-6);
        c.dolly(-100.0);
        assert!((c.radius - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_disabled() {
        let mut c = controls();
        c.enable_zoom = false;
        c.dolly(5.0);
        assert!((c.radius - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_pan_disabled_by_default() {
        let mut c = controls();
        c.pan(50.0, 50.0, 600.0, 1.0);
        assert_eq!(c.target, Point3::origin());

        c.enable_pan = true;
        c.pan(50.0, 0.0, 600.0, 1.0);
        assert!(c.target.x < 0.0);
    }

    #[test]
    fn test_full_height_drag_is_full_turn() {
        let mut c = controls();
        c.rotate_by_pixels(300.0, 0.0, 600.0);
        assert!((c.theta - PI).abs() < 1e-4);
    }

    #[test]
    fn test_polar_angle_stays_off_the_poles() {
        let mut c = controls();
        c.rotate_up(10.0);
        assert!(c.phi > 0.0);
        c.rotate_up(-20.0);
        assert!(c.phi < PI);
    }

    #[test]
    fn test_auto_rotate_speed() {
        let mut c = controls();
        c.update(60.0);
        // Half a turn per minute at speed 0.5
        assert!((c.theta - PI).abs() < 1e-3);
    }

    #[test]
    fn test_auto_rotate_pauses_while_dragging_or_disabled() {
        let mut c = controls();
        c.set_dragging(true);
        c.update(1.0);
        assert!(c.theta.abs() < 1e-6);

        c.set_dragging(false);
        c.auto_rotate = false;
        c.update(1.0);
        assert!(c.theta.abs() < 1e-6);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut c = controls();
        c.rotate_by_pixels(120.0, 40.0, 600.0);
        c.dolly(3.0);
        c.reset();
        assert_eq!(c, controls());
    }
}
