/// Interaction flags of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerState {
    /// Pointer is over the product
    pub hovered: bool,
    /// Product was clicked an odd number of times
    pub clicked: bool,
    /// Toggle button state
    pub auto_rotate: bool,
}

/// Toggle button labels
pub const STOP_ROTATION: &str = "Stop Rotation";
pub const AUTO_ROTATE: &str = "Auto Rotate";

impl ViewerState {
    pub fn new() -> Self {
        Self {
            hovered: false,
            clicked: false,
            auto_rotate: true,
        }
    }

    /// Returns true when the flag changed
    pub fn pointer_over(&mut self) -> bool {
        !std::mem::replace(&mut self.hovered, true)
    }

    pub fn pointer_out(&mut self) -> bool {
        std::mem::replace(&mut self.hovered, false)
    }

    pub fn click(&mut self) -> bool {
        self.clicked = !self.clicked;
        log::debug!("product clicked, clicked={}", self.clicked);
        true
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        log::debug!("auto-rotate toggled, auto_rotate={}", self.auto_rotate);
        true
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.auto_rotate {
            STOP_ROTATION
        } else {
            AUTO_ROTATE
        }
    }

    /// Camera turntable runs unless the product is clicked or the button
    /// switched it off
    pub fn orbit_auto_rotate(&self) -> bool {
        self.auto_rotate && !self.clicked
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}
