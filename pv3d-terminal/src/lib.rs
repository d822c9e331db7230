/// Terminal host for the product viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue, terminal,
};
use pv3d_core::{Framebuffer, OverlayLayout, PointerButton, ProductViewer, Result};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::BlockRenderer;
use renderer::{cell_to_pixel, pixel_size};

/// Keyboard orbit step as a fraction of the viewport height
const KEY_ORBIT_FRACTION: f32 = 1.0 / 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalOptions {
    pub fps: u32,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    viewer: ProductViewer,
    options: TerminalOptions,
    framebuffer: Framebuffer,
    renderer: BlockRenderer,
    running: bool,
    /// Left press landed on the toggle button; swallow its release
    button_pressed: bool,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(viewer: ProductViewer, options: TerminalOptions) -> Result<Self> {
        let (columns, rows) = terminal::size()?;
        Self::with_size(viewer, options, columns, rows)
    }

    fn with_size(
        mut viewer: ProductViewer,
        options: TerminalOptions,
        columns: u16,
        rows: u16,
    ) -> Result<Self> {
        let (width, height) = pixel_size(columns, rows);
        viewer.resize(width as u32, height as u32);

        Ok(Self {
            viewer,
            options,
            framebuffer: Framebuffer::new(width, height)?,
            renderer: BlockRenderer::new(columns, rows),
            running: true,
            button_pressed: false,
            last_tick: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn viewer(&self) -> &ProductViewer {
        &self.viewer
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        let entered = execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        );

        let result = match entered {
            Ok(()) => self.main_loop(),
            Err(err) => Err(err.into()),
        };

        // Cleanup, whatever the loop returned
        let restored = restore_terminal();
        log::info!("terminal viewer stopped");
        result.and(restored)
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_secs_f32(1.0 / self.options.fps.max(1) as f32);
        log::info!("terminal viewer running at {} FPS", self.options.fps);
        self.last_tick = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event)?;
            }
            if !self.running {
                break;
            }

            // Update
            let now = Instant::now();
            let dt = (now - self.last_tick).as_secs_f32();
            self.last_tick = now;
            self.viewer.tick(dt);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn layout(&self) -> OverlayLayout {
        OverlayLayout::compute(
            self.renderer.columns(),
            self.renderer.rows(),
            &self.viewer.overlay(),
        )
    }

    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => self.resize(columns, rows)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let step = self.framebuffer.height() as f32 * KEY_ORBIT_FRACTION;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char(' ') | KeyCode::Char('t') => {
                self.viewer.toggle_auto_rotate();
            }
            KeyCode::Char('w') | KeyCode::Up => {
                self.viewer.orbit_by_pixels(0.0, -step);
            }
            KeyCode::Char('s') | KeyCode::Down => {
                self.viewer.orbit_by_pixels(0.0, step);
            }
            KeyCode::Char('a') | KeyCode::Left => {
                self.viewer.orbit_by_pixels(-step, 0.0);
            }
            KeyCode::Char('d') | KeyCode::Right => {
                self.viewer.orbit_by_pixels(step, 0.0);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.viewer.wheel(1.0);
            }
            KeyCode::Char('-') => {
                self.viewer.wheel(-1.0);
            }
            KeyCode::Char('r') => {
                self.viewer.reset_view();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let MouseEvent {
            kind, column, row, ..
        } = mouse;
        let (x, y) = cell_to_pixel(column, row);

        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.layout().button.contains(column, row) {
                    self.button_pressed = true;
                    let label = self.viewer.toggle_auto_rotate();
                    log::debug!("toggle button pressed, now showing {label:?}");
                } else {
                    self.viewer.pointer_pressed(x, y, PointerButton::Primary);
                }
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.viewer.pointer_pressed(x, y, PointerButton::Secondary);
            }
            MouseEventKind::Up(button) => {
                if button == MouseButton::Left && self.button_pressed {
                    self.button_pressed = false;
                } else if let Some(button) = pointer_button(button) {
                    self.viewer.pointer_released(x, y, button);
                }
            }
            MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                self.viewer.pointer_moved(x, y);
            }
            MouseEventKind::ScrollUp => self.viewer.wheel(1.0),
            MouseEventKind::ScrollDown => self.viewer.wheel(-1.0),
            _ => {}
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        let (width, height) = pixel_size(columns, rows);
        self.framebuffer.resize(width, height)?;
        self.renderer.resize(columns, rows);
        self.viewer.resize(width as u32, height as u32);
        if self.layout().viewport_rows().is_empty() {
            log::warn!("terminal of {columns}x{rows} leaves no room for the product");
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let labels = self.viewer.render(&mut self.framebuffer);
        let overlay = self.viewer.overlay();
        let layout = self.layout();

        let mut stdout = stdout();
        self.renderer.draw(&self.framebuffer, &mut stdout)?;
        self.renderer.draw_labels(&labels, &self.framebuffer, &mut stdout)?;
        self.renderer.draw_overlay(&overlay, &layout, self.fps, &mut stdout)?;
        queue!(stdout, cursor::MoveTo(0, 0))?;

        stdout.flush()?;
        Ok(())
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => None,
    }
}

fn restore_terminal() -> Result<()> {
    let shown = execute!(
        stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    terminal::disable_raw_mode()?;
    shown?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use pv3d_core::ViewerConfig;

    fn app() -> TerminalApp {
        let viewer = ProductViewer::new(ViewerConfig::default()).unwrap();
        TerminalApp::with_size(viewer, TerminalOptions::default(), 100, 40).unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_viewer_sized_to_half_blocks() {
        let app = app();
        assert_eq!(app.viewer().viewport(), (100, 80));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.handle_event(key(KeyCode::Char('q'))).unwrap();
        assert!(!app.running);

        let mut app = self::app();
        app.handle_event(key(KeyCode::Esc)).unwrap();
        assert!(!app.running);
    }

    #[test]
    fn test_space_toggles_rotation() {
        let mut app = app();
        app.handle_event(key(KeyCode::Char(' '))).unwrap();
        assert!(!app.viewer().state().auto_rotate);
        app.handle_event(key(KeyCode::Char('t'))).unwrap();
        assert!(app.viewer().state().auto_rotate);
    }

    #[test]
    fn test_click_on_button_toggles_rotation() {
        let mut app = app();
        let button = app.layout().button;
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), button.x + 1, button.y))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), button.x + 1, button.y))
            .unwrap();
        assert!(!app.viewer().state().auto_rotate);
        assert!(!app.viewer().state().clicked);
    }

    #[test]
    fn test_click_on_product_toggles_clicked() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 50, 20))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 50, 20))
            .unwrap();
        assert!(app.viewer().state().clicked);
    }

    #[test]
    fn test_mouse_move_hovers_product() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Moved, 50, 20)).unwrap();
        assert!(app.viewer().state().hovered);
        app.handle_event(mouse(MouseEventKind::Moved, 1, 1)).unwrap();
        assert!(!app.viewer().state().hovered);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut app = app();
        let distance = |app: &TerminalApp| {
            let camera = app.viewer().camera();
            (camera.position - camera.target).norm()
        };
        let before = distance(&app);
        app.handle_event(mouse(MouseEventKind::ScrollUp, 50, 20)).unwrap();
        assert!(distance(&app) < before);
    }

    #[test]
    fn test_resize_event() {
        let mut app = app();
        app.handle_event(Event::Resize(60, 20)).unwrap();
        assert_eq!(app.viewer().viewport(), (60, 40));
        assert_eq!(app.framebuffer.height(), 40);
    }
}
