/// PV3D Web - Canvas host for the product viewer
///
/// The scene is rasterized by `pv3d-core` into a framebuffer and copied to a
/// 2D canvas with `put_image_data`; labels are drawn with canvas text and the
/// page chrome is plain DOM. The page calls `frame` from its
/// `requestAnimationFrame` loop.
use std::cell::RefCell;
use std::rc::Rc;

use pv3d_core::overlay::Overlay;
use pv3d_core::scene::{AnchorX, AnchorY};
use pv3d_core::{Framebuffer, PointerButton, ProductViewer, ProjectedLabel, ViewerConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    ImageData,
};

const DEFAULT_SIZE: (u32, u32) = (800, 600);

/// Longest frame step fed to the animation, e.g. after a background tab
const MAX_FRAME_SECONDS: f32 = 0.25;

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Rc<RefCell<ProductViewer>>,
    framebuffer: Framebuffer,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    button: HtmlButtonElement,
    last_timestamp: Option<f64>,
    /// Keep listeners alive as long as the viewer
    _event_closures: Vec<JsValue>,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<WebViewer, JsValue> {
        Self::build(container_id, ViewerConfig::default())
    }

    /// Same as `new` with a TOML configuration
    pub fn with_config(container_id: &str, toml: &str) -> Result<WebViewer, JsValue> {
        let config = ViewerConfig::from_toml_str(toml).map_err(to_js)?;
        Self::build(container_id, config)
    }

    fn build(container_id: &str, config: ViewerConfig) -> Result<WebViewer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{container_id}")))?
            .dyn_into::<HtmlElement>()?;
        container.set_attribute("style", "position: relative; overflow: hidden;")?;

        let (width, height) = match (container.client_width(), container.client_height()) {
            (w, h) if w > 0 && h > 0 => (w as u32, h as u32),
            _ => DEFAULT_SIZE,
        };

        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        canvas.set_width(width);
        canvas.set_height(height);
        canvas.set_attribute("style", "display: block; width: 100%; height: 100%;")?;
        container.append_child(&canvas)?;

        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let mut viewer = ProductViewer::new(config).map_err(to_js)?;
        viewer.resize(width, height);
        let overlay = viewer.overlay();
        let viewer = Rc::new(RefCell::new(viewer));

        let button = build_overlay(&document, &container, &overlay)?;
        let closures = register_listeners(&canvas, &button, &viewer)?;
        log::info!("web viewer mounted in #{container_id} at {width}x{height}");

        Ok(WebViewer {
            viewer,
            framebuffer: Framebuffer::new(width as usize, height as usize).map_err(to_js)?,
            canvas,
            context,
            button,
            last_timestamp: None,
            _event_closures: closures,
        })
    }

    /// Advance and draw one frame; `timestamp_ms` comes from
    /// `requestAnimationFrame`
    pub fn frame(&mut self, timestamp_ms: f64) -> Result<(), JsValue> {
        let dt = frame_seconds(self.last_timestamp, timestamp_ms);
        self.last_timestamp = Some(timestamp_ms);

        let mut viewer = self.viewer.borrow_mut();
        viewer.tick(dt);
        let labels = viewer.render(&mut self.framebuffer);

        let bytes = self.framebuffer.to_rgba8();
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&bytes),
            self.framebuffer.width() as u32,
            self.framebuffer.height() as u32,
        )?;
        self.context.put_image_data(&image, 0.0, 0.0)?;

        for label in &labels {
            self.draw_label(label)?;
        }

        self.button
            .set_text_content(Some(viewer.state().toggle_label()));
        let cursor = if viewer.state().hovered { "pointer" } else { "grab" };
        self.canvas.style().set_property("cursor", cursor)?;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.framebuffer
            .resize(width as usize, height as usize)
            .map_err(to_js)?;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.viewer.borrow_mut().resize(width, height);
        Ok(())
    }

    /// Returns the new button label
    pub fn toggle_auto_rotate(&mut self) -> String {
        let label = self.viewer.borrow_mut().toggle_auto_rotate();
        self.button.set_text_content(Some(label));
        label.to_string()
    }

    pub fn is_hovered(&self) -> bool {
        self.viewer.borrow().state().hovered
    }

    pub fn is_clicked(&self) -> bool {
        self.viewer.borrow().state().clicked
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.viewer.borrow().state().auto_rotate
    }
}

impl WebViewer {
    fn draw_label(&self, label: &ProjectedLabel) -> Result<(), JsValue> {
        let ctx = &self.context;
        ctx.set_font(&label_font(label));
        ctx.set_text_align(match label.anchor_x {
            AnchorX::Left => "left",
            AnchorX::Center => "center",
            AnchorX::Right => "right",
        });
        ctx.set_text_baseline(match label.anchor_y {
            AnchorY::Top => "top",
            AnchorY::Middle => "middle",
            AnchorY::Bottom => "bottom",
        });
        ctx.set_fill_style(&JsValue::from_str(&label.color.to_css()));
        ctx.fill_text(&label.text, label.x as f64, label.y as f64)
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"pv3d: logger already initialised".into());
    }
}

fn to_js(err: pv3d_core::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn element(document: &Document, tag: &str, style: &str) -> Result<HtmlElement, JsValue> {
    let el = document.create_element(tag)?.dyn_into::<HtmlElement>()?;
    el.set_attribute("style", style)?;
    Ok(el)
}

/// Header, toggle button, controls panel and badge over the canvas. Returns
/// the button so its label can follow the state.
fn build_overlay(
    document: &Document,
    container: &HtmlElement,
    overlay: &Overlay,
) -> Result<HtmlButtonElement, JsValue> {
    let header = element(
        document,
        "div",
        "position: absolute; top: 24px; left: 24px; color: white; \
         font-family: sans-serif; pointer-events: none;",
    )?;
    let title = element(document, "h1", "margin: 0; font-size: 28px; font-weight: bold;")?;
    title.set_text_content(Some(overlay.title));
    let subtitle = element(document, "p", "margin: 4px 0 0; color: #cbd5e1;")?;
    subtitle.set_text_content(Some(overlay.subtitle));
    header.append_child(&title)?;
    header.append_child(&subtitle)?;
    container.append_child(&header)?;

    let button = element(
        document,
        "button",
        "position: absolute; top: 72px; right: 24px; padding: 8px 16px; \
         border: 1px solid rgba(255,255,255,0.2); border-radius: 8px; \
         background: rgba(255,255,255,0.1); color: white; cursor: pointer;",
    )?
    .dyn_into::<HtmlButtonElement>()?;
    button.set_text_content(Some(overlay.button_label));
    container.append_child(&button)?;

    let (from, to) = overlay.badge_colors;
    let badge = element(
        document,
        "div",
        &format!(
            "position: absolute; top: 24px; right: 24px; padding: 4px 12px; \
             border-radius: 9999px; color: white; font: 600 12px sans-serif; \
             background: linear-gradient(to right, {}, {});",
            from.to_css(),
            to.to_css()
        ),
    )?;
    badge.set_text_content(Some(overlay.badge));
    container.append_child(&badge)?;

    let controls = element(
        document,
        "div",
        "position: absolute; bottom: 24px; left: 50%; transform: translateX(-50%); \
         padding: 16px; border-radius: 12px; background: rgba(0,0,0,0.3); \
         color: white; font: 14px sans-serif; pointer-events: none;",
    )?;
    let heading = element(document, "h3", "margin: 0 0 8px; font-size: 16px;")?;
    heading.set_text_content(Some(overlay.controls_title));
    controls.append_child(&heading)?;
    for hint in &overlay.hints {
        let row = element(document, "div", "display: flex; align-items: center; gap: 8px; color: #cbd5e1;")?;
        let bullet = element(
            document,
            "span",
            &format!(
                "width: 8px; height: 8px; border-radius: 50%; background: {};",
                hint.bullet.to_css()
            ),
        )?;
        let text = element(document, "span", "")?;
        text.set_text_content(Some(hint.text));
        row.append_child(&bullet)?;
        row.append_child(&text)?;
        controls.append_child(&row)?;
    }
    container.append_child(&controls)?;

    Ok(button)
}

fn register_listeners(
    canvas: &HtmlCanvasElement,
    button: &HtmlButtonElement,
    viewer: &Rc<RefCell<ProductViewer>>,
) -> Result<Vec<JsValue>, JsValue> {
    let mut closures: Vec<JsValue> = Vec::new();

    // Pointer move
    {
        let viewer = viewer.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
            let (x, y) = event_position(&canvas_clone, &event);
            viewer.borrow_mut().pointer_moved(x, y);
        });
        canvas.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Pointer down
    {
        let viewer = viewer.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
            if let Some(button) = pointer_button(event.button()) {
                let (x, y) = event_position(&canvas_clone, &event);
                viewer.borrow_mut().pointer_pressed(x, y, button);
            }
        });
        canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Pointer up
    {
        let viewer = viewer.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
            if let Some(button) = pointer_button(event.button()) {
                let (x, y) = event_position(&canvas_clone, &event);
                viewer.borrow_mut().pointer_released(x, y, button);
            }
        });
        canvas.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Pointer leave
    {
        let viewer = viewer.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            viewer.borrow_mut().pointer_left();
        });
        canvas.add_event_listener_with_callback("pointerleave", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Wheel
    {
        let viewer = viewer.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::WheelEvent| {
            // Keep the page from scrolling
            event.prevent_default();
            let steps = wheel_steps(event.delta_y(), event.delta_mode());
            viewer.borrow_mut().wheel(steps);
        });
        canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Context menu (secondary button pans)
    {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
            event.prevent_default();
        });
        canvas.add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    // Toggle button
    {
        let viewer = viewer.clone();
        let button_clone = button.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let label = viewer.borrow_mut().toggle_auto_rotate();
            button_clone.set_text_content(Some(label));
        });
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closures.push(closure.into_js_value());
    }

    Ok(closures)
}

/// Event position in canvas pixels, accounting for CSS scaling
fn event_position(canvas: &HtmlCanvasElement, event: &web_sys::MouseEvent) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    to_canvas_pixels(
        (event.client_x() as f64, event.client_y() as f64),
        (rect.left(), rect.top(), rect.width(), rect.height()),
        (canvas.width(), canvas.height()),
    )
}

fn to_canvas_pixels(
    client: (f64, f64),
    rect: (f64, f64, f64, f64),
    canvas: (u32, u32),
) -> (f32, f32) {
    let (left, top, width, height) = rect;
    let scale_x = if width > 0.0 { canvas.0 as f64 / width } else { 1.0 };
    let scale_y = if height > 0.0 { canvas.1 as f64 / height } else { 1.0 };
    (
        ((client.0 - left) * scale_x) as f32,
        ((client.1 - top) * scale_y) as f32,
    )
}

fn pointer_button(button: i16) -> Option<PointerButton> {
    match button {
        0 => Some(PointerButton::Primary),
        2 => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Zoom steps from a wheel delta; scrolling down zooms out.
/// Delta modes: 0 = pixel, 1 = line, 2 = page
fn wheel_steps(delta_y: f64, delta_mode: u32) -> f32 {
    let scale = match delta_mode {
        0 => 0.01,
        1 => 1.0 / 3.0,
        _ => 3.0,
    };
    (-delta_y * scale) as f32
}

fn frame_seconds(last_ms: Option<f64>, now_ms: f64) -> f32 {
    match last_ms {
        Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_SECONDS),
        None => 0.0,
    }
}

fn label_font(label: &ProjectedLabel) -> String {
    let weight = if label.bold { "bold" } else { "normal" };
    format!("{weight} {}px sans-serif", label.size_px.round().max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv3d_core::Color;

    #[test]
    fn test_canvas_pixel_scaling() {
        // 400 CSS px wide canvas backed by 800 pixels
        let (x, y) = to_canvas_pixels((110.0, 60.0), (10.0, 10.0, 400.0, 300.0), (800, 600));
        assert!((x - 200.0).abs() < 1e-4);
        assert!((y - 100.0).abs() < 1e-4);

        let (x, _) = to_canvas_pixels((5.0, 5.0), (0.0, 0.0, 0.0, 0.0), (800, 600));
        assert!((x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_button_mapping() {
        assert_eq!(pointer_button(0), Some(PointerButton::Primary));
        assert_eq!(pointer_button(2), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(1), None);
    }

    #[test]
    fn test_wheel_direction() {
        assert!(wheel_steps(100.0, 0) < 0.0);
        assert!((wheel_steps(-100.0, 0) - 1.0).abs() < 1e-6);
        assert!((wheel_steps(-3.0, 1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_step_is_clamped() {
        assert_eq!(frame_seconds(None, 1000.0), 0.0);
        assert!((frame_seconds(Some(1000.0), 1016.0) - 0.016).abs() < 1e-6);
        assert_eq!(frame_seconds(Some(0.0), 60_000.0), MAX_FRAME_SECONDS);
        assert_eq!(frame_seconds(Some(2000.0), 1000.0), 0.0);
    }

    #[test]
    fn test_label_font() {
        let label = ProjectedLabel {
            text: "PREMIUM".into(),
            x: 0.0,
            y: 0.0,
            size_px: 23.6,
            color: Color::WHITE,
            bold: true,
            anchor_x: AnchorX::Center,
            anchor_y: AnchorY::Middle,
        };
        assert_eq!(label_font(&label), "bold 24px sans-serif");
    }
}
