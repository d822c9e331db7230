/// Page chrome around the 3D view: header, rotation toggle, control hints and
/// the feature badge. The content is host-independent; `OverlayLayout`
/// places it on a character grid.
use crate::color::{palette, Color};
use crate::state::ViewerState;

pub const TITLE: &str = "3D Product Viewer";
pub const SUBTITLE: &str = "Interactive product visualization";
pub const CONTROLS_TITLE: &str = "Controls";
pub const BADGE: &str = "Interactive 3D";

#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub bullet: Color,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_label: &'static str,
    pub controls_title: &'static str,
    pub hints: Vec<Hint>,
    pub badge: &'static str,
    /// Left and right ends of the badge gradient
    pub badge_colors: (Color, Color),
}

impl Overlay {
    pub fn for_state(state: &ViewerState) -> Self {
        Self {
            title: TITLE,
            subtitle: SUBTITLE,
            button_label: state.toggle_label(),
            controls_title: CONTROLS_TITLE,
            hints: vec![
                Hint {
                    bullet: palette::BLUE_400,
                    text: "Drag to rotate • Scroll to zoom",
                },
                Hint {
                    bullet: palette::PURPLE_400,
                    text: "Click product to toggle auto-rotation",
                },
                Hint {
                    bullet: palette::PINK_400,
                    text: "Hover for interactive effects",
                },
            ],
            badge: BADGE,
            badge_colors: (palette::BLUE_500, palette::PURPLE_600),
        }
    }

    /// Button text as drawn on a character grid
    pub fn button_text(&self) -> String {
        format!("[ {} ]", self.button_label)
    }
}

/// Rectangle on the character grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && row >= self.y
            && column < self.x.saturating_add(self.width)
            && row < self.y.saturating_add(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub title: CellRect,
    pub subtitle: CellRect,
    pub badge: CellRect,
    pub button: CellRect,
    pub controls: CellRect,
}

const PADDING: u16 = 2;

impl OverlayLayout {
    pub fn compute(columns: u16, rows: u16, overlay: &Overlay) -> Self {
        let text_width = |s: &str| s.chars().count() as u16;
        let right_aligned = |width: u16, row: u16| CellRect {
            x: columns.saturating_sub(PADDING + width),
            y: row,
            width: width.min(columns),
            height: 1,
        };

        let title = CellRect {
            x: PADDING,
            y: 1,
            width: text_width(overlay.title),
            height: 1,
        };
        let subtitle = CellRect {
            x: PADDING,
            y: 2,
            width: text_width(overlay.subtitle),
            height: 1,
        };
        let badge = right_aligned(text_width(overlay.badge) + 2, 1);
        let button = right_aligned(text_width(&overlay.button_text()), 3);

        // Title row, one row per hint, border above and below
        let widest_hint = overlay
            .hints
            .iter()
            .map(|h| text_width(h.text) + 2)
            .chain(std::iter::once(text_width(overlay.controls_title)))
            .max()
            .unwrap_or(0);
        let controls_width = (widest_hint + 4).min(columns.saturating_sub(2 * PADDING));
        let controls_height = overlay.hints.len() as u16 + 3;
        let controls = CellRect {
            x: columns.saturating_sub(controls_width) / 2,
            y: rows.saturating_sub(controls_height + 1),
            width: controls_width,
            height: controls_height,
        };

        Self {
            title,
            subtitle,
            badge,
            button,
            controls,
        }
    }

    /// Rows free for the 3D view between header and controls panel
    pub fn viewport_rows(&self) -> std::ops::Range<u16> {
        let top = self.button.y + 1;
        top.min(self.controls.y)..self.controls.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_follows_state() {
        let mut state = ViewerState::new();
        let overlay = Overlay::for_state(&state);
        assert_eq!(overlay.title, "3D Product Viewer");
        assert_eq!(overlay.subtitle, "Interactive product visualization");
        assert_eq!(overlay.button_label, "Stop Rotation");
        assert_eq!(overlay.badge, "Interactive 3D");
        assert_eq!(overlay.hints.len(), 3);
        assert_eq!(overlay.hints[1].text, "Click product to toggle auto-rotation");

        state.toggle_auto_rotate();
        assert_eq!(Overlay::for_state(&state).button_text(), "[ Auto Rotate ]");
    }

    #[test]
    fn test_layout_positions() {
        let overlay = Overlay::for_state(&ViewerState::new());
        let layout = OverlayLayout::compute(100, 40, &overlay);

        assert_eq!(layout.title.x, 2);
        assert_eq!(layout.button.width, 17);
        assert_eq!(layout.button.x + layout.button.width, 98);
        assert_eq!(layout.badge.x + layout.badge.width, 98);
        assert_eq!(layout.controls.height, 6);
        assert_eq!(layout.controls.y + layout.controls.height, 39);
        assert!(layout.viewport_rows().contains(&20));
    }

    #[test]
    fn test_button_hit_test() {
        let overlay = Overlay::for_state(&ViewerState::new());
        let layout = OverlayLayout::compute(100, 40, &overlay);
        let b = layout.button;
        assert!(b.contains(b.x, b.y));
        assert!(b.contains(b.x + b.width - 1, b.y));
        assert!(!b.contains(b.x + b.width, b.y));
        assert!(!b.contains(b.x, b.y + 1));
        assert!(!b.contains(0, 0));
    }

    #[test]
    fn test_tiny_terminal_does_not_underflow() {
        let overlay = Overlay::for_state(&ViewerState::new());
        let layout = OverlayLayout::compute(5, 3, &overlay);
        assert!(layout.controls.width <= 5);
        assert!(layout.viewport_rows().is_empty());
    }
}
