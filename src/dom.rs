use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Keep the canvas backing store in sync with its CSS size and the device
/// pixel ratio so the field stays crisp after layout changes.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio().min(2.0);
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}

/// Read an optional `data-*` attribute from the mount element.
#[inline]
pub fn data_attr(canvas: &web::HtmlCanvasElement, name: &str) -> Option<String> {
    canvas
        .get_attribute(&format!("data-{name}"))
        .filter(|v| !v.is_empty())
}
