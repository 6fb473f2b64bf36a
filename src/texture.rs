//! Sprite loading for the particle quads.
//!
//! Images are fetched and decoded asynchronously, rasterized to RGBA through
//! a scratch 2D canvas, and cached for the process lifetime so a remount
//! never refetches. A sprite that fails to load is replaced by a procedural
//! radial-falloff stand-in and logged: a missing decorative sprite is a
//! cosmetic degradation, not a reason to abort initialization.

use crate::constants::TextureKey;
use anyhow::{anyhow, Result};
use fnv::FnvHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Decoded RGBA pixels, ready for `queue.write_texture`.
#[derive(Clone, Debug)]
pub struct SpritePixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

thread_local! {
    static CACHE: RefCell<FnvHashMap<TextureKey, Rc<SpritePixels>>> =
        RefCell::new(FnvHashMap::default());
}

/// Load every sprite the presets reference. Idempotent across remounts.
pub async fn load_sprites() -> FnvHashMap<TextureKey, Rc<SpritePixels>> {
    let mut sprites = FnvHashMap::default();
    for key in TextureKey::ALL {
        if let Some(cached) = CACHE.with(|c| c.borrow().get(&key).cloned()) {
            sprites.insert(key, cached);
            continue;
        }
        let pixels = match load_image_rgba(key.url()).await {
            Ok(p) => Rc::new(p),
            Err(e) => {
                log::warn!("sprite {:?} failed to load ({e}); using fallback", key);
                Rc::new(fallback_sprite(key))
            }
        };
        CACHE.with(|c| c.borrow_mut().insert(key, pixels.clone()));
        sprites.insert(key, pixels);
    }
    sprites
}

async fn load_image_rgba(url: &str) -> Result<SpritePixels> {
    let image = web::HtmlImageElement::new().map_err(|e| anyhow!("image element: {e:?}"))?;
    image.set_cross_origin(Some("anonymous"));
    image.set_src(url);
    JsFuture::from(image.decode())
        .await
        .map_err(|e| anyhow!("decode {url}: {e:?}"))?;

    let width = image.natural_width().max(1);
    let height = image.natural_height().max(1);

    let document = crate::dom::window_document().ok_or_else(|| anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow!("scratch canvas: {e:?}"))?
        .dyn_into()
        .map_err(|e| anyhow!("scratch canvas: {e:?}"))?;
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx: web::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|e| anyhow!("2d context: {e:?}"))?
        .ok_or_else(|| anyhow!("2d context unavailable"))?
        .dyn_into()
        .map_err(|e| anyhow!("2d context: {e:?}"))?;
    ctx.draw_image_with_html_image_element(&image, 0.0, 0.0)
        .map_err(|e| anyhow!("draw {url}: {e:?}"))?;
    let image_data = ctx
        .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
        .map_err(|e| anyhow!("read pixels {url}: {e:?}"))?;

    Ok(SpritePixels {
        width,
        height,
        rgba: image_data.data().0,
    })
}

/// Procedural white sprite with a per-key radial falloff. 64x64 is plenty for
/// an additive-blended billboard.
fn fallback_sprite(key: TextureKey) -> SpritePixels {
    const SIZE: u32 = 64;
    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    let center = (SIZE as f32 - 1.0) * 0.5;
    for y in 0..SIZE {
        for x in 0..SIZE {
            let dx = (x as f32 - center) / center;
            let dy = (y as f32 - center) / center;
            let d = (dx * dx + dy * dy).sqrt().min(1.0);
            let fall = 1.0 - d;
            let alpha = match key {
                TextureKey::Glow => fall * fall,
                TextureKey::Orb => (fall * 3.0).min(1.0) * fall.sqrt(),
                TextureKey::Spark => fall.powi(4) + 0.25 * fall * fall,
            };
            let a = (alpha.clamp(0.0, 1.0) * 255.0) as u8;
            rgba.extend_from_slice(&[255, 255, 255, a]);
        }
    }
    SpritePixels {
        width: SIZE,
        height: SIZE,
        rgba,
    }
}
