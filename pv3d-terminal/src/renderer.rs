/// Half-block renderer: two framebuffer pixels per terminal cell
use crossterm::{
    cursor::MoveTo,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    QueueableCommand,
};
use std::io::Write;
use pv3d_core::color::palette;
use pv3d_core::overlay::CellRect;
use pv3d_core::scene::AnchorX;
use pv3d_core::{Color as SceneColor, Framebuffer, Overlay, OverlayLayout, ProjectedLabel};

/// Upper half block; foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '▀';

pub fn to_terminal_color(color: SceneColor) -> Color {
    let [r, g, b] = color.to_rgb8();
    Color::Rgb { r, g, b }
}

/// Pixel under the middle of a terminal cell
pub fn cell_to_pixel(column: u16, row: u16) -> (f32, f32) {
    (column as f32, row as f32 * 2.0 + 1.0)
}

/// Framebuffer size for a terminal of `columns` x `rows`
pub fn pixel_size(columns: u16, rows: u16) -> (usize, usize) {
    (columns.max(1) as usize, rows.max(1) as usize * 2)
}

/// First column of a label of `len` characters anchored at pixel column `x`
pub fn label_column(x: f32, len: usize, anchor: AnchorX) -> i32 {
    let x = x.round() as i32;
    match anchor {
        AnchorX::Left => x,
        AnchorX::Center => x - len as i32 / 2,
        AnchorX::Right => x - len as i32,
    }
}

pub struct BlockRenderer {
    columns: u16,
    rows: u16,
}

impl BlockRenderer {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Blit the framebuffer, skipping color changes between equal cells
    pub fn draw<W: Write>(&self, framebuffer: &Framebuffer, writer: &mut W) -> std::io::Result<()> {
        let columns = (self.columns as usize).min(framebuffer.width());
        let rows = (self.rows as usize).min(framebuffer.height() / 2);
        let mut current: Option<(SceneColor, SceneColor)> = None;

        for row in 0..rows {
            writer.queue(MoveTo(0, row as u16))?;
            for column in 0..columns {
                let top = framebuffer.pixel(column, row * 2);
                let bottom = framebuffer.pixel(column, row * 2 + 1);
                if current != Some((top, bottom)) {
                    writer.queue(SetForegroundColor(to_terminal_color(top)))?;
                    writer.queue(SetBackgroundColor(to_terminal_color(bottom)))?;
                    current = Some((top, bottom));
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    /// Product labels printed over the image, on the colour behind them
    pub fn draw_labels<W: Write>(
        &self,
        labels: &[ProjectedLabel],
        framebuffer: &Framebuffer,
        writer: &mut W,
    ) -> std::io::Result<()> {
        for label in labels {
            let len = label.text.chars().count();
            let row = (label.y / 2.0).floor() as i32;
            let column = label_column(label.x, len, label.anchor_x);
            if row < 0 || row >= self.rows as i32 || column < 0 {
                continue;
            }
            let visible: String = label
                .text
                .chars()
                .take((self.columns as i32 - column).max(0) as usize)
                .collect();
            if visible.is_empty() {
                continue;
            }

            let behind = framebuffer.pixel(
                (column as usize).min(framebuffer.width() - 1),
                (row as usize * 2).min(framebuffer.height() - 1),
            );
            writer.queue(MoveTo(column as u16, row as u16))?;
            writer.queue(SetBackgroundColor(to_terminal_color(behind)))?;
            writer.queue(SetForegroundColor(to_terminal_color(label.color)))?;
            if label.bold {
                writer.queue(SetAttribute(Attribute::Bold))?;
            }
            writer.queue(Print(visible))?;
            writer.queue(SetAttribute(Attribute::Reset))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    pub fn draw_overlay<W: Write>(
        &self,
        overlay: &Overlay,
        layout: &OverlayLayout,
        fps: f32,
        writer: &mut W,
    ) -> std::io::Result<()> {
        // Header
        self.print_at(writer, layout.title, overlay.title, SceneColor::WHITE, None, true)?;
        let fps_rect = CellRect {
            x: layout.title.x + layout.title.width + 2,
            ..layout.title
        };
        self.print_at(writer, fps_rect, &format!("{fps:.1} FPS"), palette::SLATE_300, None, false)?;
        self.print_at(writer, layout.subtitle, overlay.subtitle, palette::SLATE_300, None, false)?;

        // Badge with its gradient spread across the cells
        let badge_text = format!(" {} ", overlay.badge);
        let (from, to) = overlay.badge_colors;
        let span = (badge_text.chars().count().max(2) - 1) as f32;
        for (i, ch) in badge_text.chars().enumerate() {
            let rect = CellRect {
                x: layout.badge.x + i as u16,
                width: 1,
                ..layout.badge
            };
            let bg = from.lerp(to, i as f32 / span);
            self.print_at(writer, rect, &ch.to_string(), SceneColor::WHITE, Some(bg), true)?;
        }

        self.print_at(
            writer,
            layout.button,
            &overlay.button_text(),
            SceneColor::WHITE,
            Some(palette::GRAY_800),
            true,
        )?;

        self.draw_controls(overlay, layout.controls, writer)?;
        writer.queue(ResetColor)?;
        Ok(())
    }

    fn draw_controls<W: Write>(
        &self,
        overlay: &Overlay,
        rect: CellRect,
        writer: &mut W,
    ) -> std::io::Result<()> {
        if rect.width < 2 || rect.height < 2 {
            return Ok(());
        }
        let inner = rect.width as usize - 2;
        let bg = Some(palette::SLATE_900);
        let border = palette::SLATE_300;
        let line = |y: u16| CellRect { y, height: 1, ..rect };

        let top = format!("┌{}┐", "─".repeat(inner));
        let bottom = format!("└{}┘", "─".repeat(inner));
        self.print_at(writer, line(rect.y), &top, border, bg, false)?;
        self.print_at(writer, line(rect.y + rect.height - 1), &bottom, border, bg, false)?;

        let title = format!("│ {:<width$}│", overlay.controls_title, width = inner.saturating_sub(1));
        self.print_at(writer, line(rect.y + 1), &title, SceneColor::WHITE, bg, true)?;

        for (i, hint) in overlay.hints.iter().enumerate() {
            let y = rect.y + 2 + i as u16;
            if y >= rect.y + rect.height - 1 {
                break;
            }
            let text = format!("  {:<width$}│", hint.text, width = inner.saturating_sub(2));
            self.print_at(writer, line(y), "│", border, bg, false)?;
            let bullet = CellRect { x: rect.x + 2, ..line(y) };
            let body = CellRect { x: rect.x + 1, ..line(y) };
            self.print_at(writer, body, &text, palette::SLATE_300, bg, false)?;
            self.print_at(writer, bullet, "●", hint.bullet, bg, false)?;
        }
        Ok(())
    }

    /// Print clipped to the rectangle's row and the screen width
    fn print_at<W: Write>(
        &self,
        writer: &mut W,
        rect: CellRect,
        text: &str,
        fg: SceneColor,
        bg: Option<SceneColor>,
        bold: bool,
    ) -> std::io::Result<()> {
        if rect.y >= self.rows || rect.x >= self.columns {
            return Ok(());
        }
        let room = (self.columns - rect.x) as usize;
        let visible: String = text.chars().take(room).collect();

        writer.queue(MoveTo(rect.x, rect.y))?;
        writer.queue(SetForegroundColor(to_terminal_color(fg)))?;
        if let Some(bg) = bg {
            writer.queue(SetBackgroundColor(to_terminal_color(bg)))?;
        }
        if bold {
            writer.queue(SetAttribute(Attribute::Bold))?;
        }
        writer.queue(Print(visible))?;
        writer.queue(SetAttribute(Attribute::Reset))?;
        writer.queue(ResetColor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv3d_core::ViewerState;

    #[test]
    fn test_color_conversion() {
        let c = SceneColor::from_hex("#6366f1").unwrap();
        assert_eq!(to_terminal_color(c), Color::Rgb { r: 0x63, g: 0x66, b: 0xf1 });
    }

    #[test]
    fn test_cell_pixel_mapping() {
        assert_eq!(cell_to_pixel(0, 0), (0.0, 1.0));
        assert_eq!(cell_to_pixel(10, 3), (10.0, 7.0));
        assert_eq!(pixel_size(80, 24), (80, 48));
        assert_eq!(pixel_size(0, 0), (1, 2));
    }

    #[test]
    fn test_label_anchoring() {
        assert_eq!(label_column(40.0, 7, AnchorX::Center), 37);
        assert_eq!(label_column(40.0, 7, AnchorX::Left), 40);
        assert_eq!(label_column(40.0, 7, AnchorX::Right), 33);
    }

    #[test]
    fn test_draw_emits_one_block_per_cell() {
        let mut fb = Framebuffer::new(6, 4).unwrap();
        fb.clear_gradient(&[SceneColor::BLACK, SceneColor::WHITE]);
        let renderer = BlockRenderer::new(6, 2);

        let mut out = Vec::new();
        renderer.draw(&fb, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HALF_BLOCK).count(), 12);
    }

    #[test]
    fn test_overlay_contains_button_and_hints() {
        let overlay = Overlay::for_state(&ViewerState::new());
        let layout = OverlayLayout::compute(100, 40, &overlay);
        let renderer = BlockRenderer::new(100, 40);

        let mut out = Vec::new();
        renderer.draw_overlay(&overlay, &layout, 29.7, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[ Stop Rotation ]"));
        assert!(text.contains("3D Product Viewer"));
        assert!(text.contains("29.7 FPS"));
        assert!(text.contains("Hover for interactive effects"));
    }

    #[test]
    fn test_offscreen_labels_are_skipped() {
        let fb = Framebuffer::new(10, 10).unwrap();
        let renderer = BlockRenderer::new(10, 5);
        let label = ProjectedLabel {
            text: "PREMIUM".into(),
            x: 5.0,
            y: 40.0,
            size_px: 3.0,
            color: SceneColor::WHITE,
            bold: true,
            anchor_x: AnchorX::Center,
            anchor_y: pv3d_core::scene::AnchorY::Middle,
        };
        let mut out = Vec::new();
        renderer.draw_labels(&[label], &fb, &mut out).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("PREMIUM"));
    }
}
