/// Per-frame product motion driven by the interaction flags
use crate::config::AnimationConfig;
use crate::scene::{BodyColors, SceneNode, BODY};
use crate::state::ViewerState;

/// Increments are specified per frame at this rate and scaled by frame time
const REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductAnimator {
    pub idle_spin: f32,
    pub active_spin: f32,
    pub hover_lift: f32,
}

impl ProductAnimator {
    pub fn from_config(config: &AnimationConfig) -> Self {
        Self {
            idle_spin: config.idle_spin,
            active_spin: config.active_spin,
            hover_lift: config.hover_lift,
        }
    }

    /// Spin faster when clicked, lift while hovered, tint on hover. Only the
    /// body moves; labels and side panels keep their place in the group.
    pub fn step(&self, state: &ViewerState, colors: &BodyColors, product: &mut SceneNode, dt: f32) {
        let Some(body) = product.find_mut(BODY) else {
            return;
        };
        let spin = if state.clicked {
            self.active_spin
        } else {
            self.idle_spin
        };
        body.pose.rotation.rotate(0.0, spin * dt * REFERENCE_FPS, 0.0);
        body.pose.position.y = if state.hovered { self.hover_lift } else { 0.0 };

        if let Some(material) = body.material_mut() {
            material.color = if state.hovered {
                colors.hovered
            } else {
                colors.idle
            };
        }
    }
}

impl Default for ProductAnimator {
    fn default() -> Self {
        Self::from_config(&AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::scene::{NodeKind, Scene};

    const FRAME: f32 = 1.0 / 60.0;

    fn showcase() -> Scene {
        Scene::product_showcase(&ViewerConfig::default()).unwrap()
    }

    fn body(product: &SceneNode) -> &SceneNode {
        product.find(BODY).unwrap()
    }

    fn body_color(product: &SceneNode) -> String {
        match &body(product).kind {
            NodeKind::Mesh { material, .. } => material.color.to_css(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_idle_spin_per_frame() {
        let mut scene = showcase();
        let animator = ProductAnimator::default();
        animator.step(&ViewerState::new(), &scene.body_colors, &mut scene.product, FRAME);
        let pose = body(&scene.product).pose;
        assert!((pose.rotation.y - 0.005).abs() < 1e-6);
        assert_eq!(pose.position.y, 0.0);
    }

    #[test]
    fn test_clicked_spins_faster() {
        let mut scene = showcase();
        let animator = ProductAnimator::default();
        let mut state = ViewerState::new();
        state.click();
        animator.step(&state, &scene.body_colors, &mut scene.product, FRAME);
        assert!((body(&scene.product).pose.rotation.y - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_frame_time_scaling() {
        let mut scene = showcase();
        let animator = ProductAnimator::default();
        // One 30 FPS frame covers two reference frames
        animator.step(&ViewerState::new(), &scene.body_colors, &mut scene.product, 2.0 * FRAME);
        assert!((body(&scene.product).pose.rotation.y - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_hover_lifts_and_tints() {
        let mut scene = showcase();
        let animator = ProductAnimator::default();
        let mut state = ViewerState::new();

        state.pointer_over();
        animator.step(&state, &scene.body_colors, &mut scene.product, FRAME);
        assert!((body(&scene.product).pose.position.y - 0.2).abs() < 1e-6);
        assert_eq!(body_color(&scene.product), "#4f46e5");

        state.pointer_out();
        animator.step(&state, &scene.body_colors, &mut scene.product, FRAME);
        assert_eq!(body(&scene.product).pose.position.y, 0.0);
        assert_eq!(body_color(&scene.product), "#6366f1");
    }

    #[test]
    fn test_group_labels_and_panels_stay_put() {
        let mut scene = showcase();
        let animator = ProductAnimator::default();
        let mut state = ViewerState::new();
        state.pointer_over();
        state.click();
        let untouched = |scene: &Scene| {
            ["label-premium", "label-product", "panel-left", "panel-right"]
                .map(|name| scene.product.find(name).unwrap().pose)
        };
        let before = untouched(&scene);

        for _ in 0..120 {
            animator.step(&state, &scene.body_colors, &mut scene.product, FRAME);
        }

        assert_eq!(untouched(&scene), before);
        assert_eq!(scene.product.pose, crate::transform::Pose::default());
        assert!((body(&scene.product).pose.rotation.y - 2.4).abs() < 1e-4);
    }
}
