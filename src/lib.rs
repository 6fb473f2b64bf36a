#![cfg(target_arch = "wasm32")]

//! Animated particle background field for the browser, rendered with WebGPU.
//!
//! The page drops a `<canvas id="particles-canvas">` into the DOM, optionally
//! tuned with `data-density`, `data-motion`, `data-base-hue`, `data-hue-range`,
//! `data-transition-speed` and `data-color-stops` attributes, then calls
//! [`mount`]. [`unmount`] tears everything down so the page can navigate away
//! (or remount with different options) without leaking GPU resources, workers
//! or listeners.

mod compute;
mod config;
mod constants;
mod controller;
mod dom;
mod group;
mod lifecycle;
mod motion;
mod pending;
mod perf;
mod render;
mod sim;
mod texture;

use config::{ColorTransition, Density, FieldOptions, MotionIntensity};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "particles-canvas";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("particles-web initialised");
}

/// Start the particle field on `#particles-canvas`. A no-op if the canvas is
/// missing or a field is already active.
#[wasm_bindgen]
pub fn mount() {
    let Some(canvas) = find_canvas() else {
        log::warn!("no #{CANVAS_ID} element; particle field not mounted");
        return;
    };
    let options = read_options(&canvas);
    log::info!("mounting particle field: {options:?}");
    controller::mount(canvas, options);
}

/// Stop the particle field and free its resources. Safe to call repeatedly.
#[wasm_bindgen]
pub fn unmount() {
    controller::unmount();
}

fn find_canvas() -> Option<web_sys::HtmlCanvasElement> {
    dom::window_document()?
        .get_element_by_id(CANVAS_ID)?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .ok()
}

fn read_options(canvas: &web_sys::HtmlCanvasElement) -> FieldOptions {
    let f32_attr = |name: &str| {
        dom::data_attr(canvas, name).and_then(|v| v.trim().parse::<f32>().ok())
    };
    let usize_attr = |name: &str| {
        dom::data_attr(canvas, name).and_then(|v| v.trim().parse::<usize>().ok())
    };
    FieldOptions {
        density: Density::parse(dom::data_attr(canvas, "density").as_deref()),
        motion: MotionIntensity::parse(dom::data_attr(canvas, "motion").as_deref()),
        colors: ColorTransition::with_overrides(
            f32_attr("base-hue"),
            f32_attr("hue-range"),
            f32_attr("transition-speed"),
            usize_attr("color-stops"),
        ),
    }
}
