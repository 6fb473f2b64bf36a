//! Particle computation backend: a dedicated worker when the host supports
//! it, otherwise the same math inline on the calling thread.
//!
//! The worker speaks a small request/response protocol over `postMessage`.
//! Exactly one response is posted per task; responses for the same task type
//! arrive in send order, so per-task FIFO resolver queues are enough to pair
//! them up. Nothing here blocks the main thread.

use crate::pending::{PendingQueues, TaskKind};
use crate::sim::{self, Hsl, InitialData};
use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T>>>;

#[derive(Clone, Copy, Debug)]
pub struct InitialDataRequest {
    pub count: usize,
    pub range: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    pub base: Hsl,
}

#[derive(Clone, Copy, Debug)]
pub struct PaletteRequest {
    pub time: f32,
    pub delta: f32,
    pub group_count: usize,
    pub base_hue: f32,
    pub hue_range: f32,
    pub speed: f32,
}

#[derive(Clone, Debug)]
pub struct PaletteResponse {
    pub time: f32,
    pub colors: Vec<[f32; 3]>,
}

/// Capability interface selected once at initialization. Both
/// implementations produce identical data; only the threading model differs.
pub trait ComputeBackend {
    fn generate_initial_data(&self, req: InitialDataRequest)
        -> LocalBoxFuture<Result<InitialData>>;
    fn update_animation_data(&self, req: PaletteRequest) -> LocalBoxFuture<Result<PaletteResponse>>;
    /// Release backend resources eagerly; outstanding requests reject instead
    /// of resolving. Dropping the backend implies this.
    fn shutdown(&self) {}
}

thread_local! {
    // Set when a worker dies after construction (script refused by CSP,
    // runtime error in the worker body). Later mounts go straight inline.
    static WORKER_BROKEN: Cell<bool> = Cell::new(false);
}

/// Pick the worker-backed backend when possible; fall back to inline math.
/// The fallback is required behavior, not an optimization: visuals must be
/// unaffected when workers are unavailable.
pub fn create_backend() -> Rc<dyn ComputeBackend> {
    if WORKER_BROKEN.with(Cell::get) {
        log::info!("particle worker failed previously; computing particles inline");
        return Rc::new(InlineCompute::new());
    }
    match WorkerCompute::new() {
        Ok(w) => {
            log::info!("particle compute running on a dedicated worker");
            Rc::new(w)
        }
        Err(e) => {
            log::warn!("worker unavailable ({e:?}); computing particles inline");
            Rc::new(InlineCompute::new())
        }
    }
}

// ---------------------------------------------------------------- inline

/// Direct-call backend: same math, main thread.
pub struct InlineCompute {
    rng: RefCell<StdRng>,
}

impl InlineCompute {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }
}

impl ComputeBackend for InlineCompute {
    fn generate_initial_data(
        &self,
        req: InitialDataRequest,
    ) -> LocalBoxFuture<Result<InitialData>> {
        let data = sim::generate_initial_data(
            &mut *self.rng.borrow_mut(),
            req.count,
            req.range,
            req.min_opacity,
            req.max_opacity,
            req.base,
        );
        Box::pin(async move { Ok(data) })
    }

    fn update_animation_data(
        &self,
        req: PaletteRequest,
    ) -> LocalBoxFuture<Result<PaletteResponse>> {
        let time = req.time + req.delta * req.speed;
        let colors = sim::shifted_palette(time, req.base_hue, req.hue_range, req.group_count);
        Box::pin(async move { Ok(PaletteResponse { time, colors }) })
    }
}

// ---------------------------------------------------------------- worker

/// A `(resolve, reject)` pair from one caller's promise.
type PromiseHandles = (js_sys::Function, js_sys::Function);

/// Message-passing backend around a Blob-URL worker.
pub struct WorkerCompute {
    worker: web::Worker,
    pending: Rc<RefCell<PendingQueues<PromiseHandles>>>,
    // Kept alive for the worker's lifetime; dropped (and unhooked) with it.
    _onmessage: Closure<dyn FnMut(web::MessageEvent)>,
    _onerror: Closure<dyn FnMut(web::ErrorEvent)>,
    _onmessageerror: Closure<dyn FnMut(web::MessageEvent)>,
}

impl WorkerCompute {
    pub fn new() -> Result<Self> {
        let parts = js_sys::Array::of1(&JsValue::from_str(WORKER_JS));
        let bag = web::BlobPropertyBag::new();
        bag.set_type("application/javascript");
        let blob = web::Blob::new_with_str_sequence_and_options(&parts, &bag)
            .map_err(|e| anyhow!("blob: {e:?}"))?;
        let url = web::Url::create_object_url_with_blob(&blob).map_err(|e| anyhow!("url: {e:?}"))?;
        let worker = web::Worker::new(&url).map_err(|e| anyhow!("worker: {e:?}"))?;
        let _ = web::Url::revoke_object_url(&url);

        let pending: Rc<RefCell<PendingQueues<PromiseHandles>>> =
            Rc::new(RefCell::new(PendingQueues::new()));

        let q = pending.clone();
        let onmessage = Closure::wrap(Box::new(move |ev: web::MessageEvent| {
            let data = ev.data();
            let task = js_sys::Reflect::get(&data, &JsValue::from_str("task"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default();
            let result = js_sys::Reflect::get(&data, &JsValue::from_str("result"))
                .unwrap_or(JsValue::UNDEFINED);
            let kind = match task.as_str() {
                "generateInitialData" => TaskKind::InitialData,
                "updateAnimationData" => TaskKind::Palette,
                other => {
                    log::warn!("unexpected worker task {other:?}");
                    return;
                }
            };
            if let Some((resolve, _reject)) = q.borrow_mut().pop(kind) {
                let _ = resolve.call1(&JsValue::NULL, &result);
            }
        }) as Box<dyn FnMut(web::MessageEvent)>);
        worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        // A worker can die after construction (CSP rejecting the blob:
        // script, a runtime error in the worker body). Without these hooks a
        // parked caller would await a response that never comes.
        let q = pending.clone();
        let onerror = Closure::wrap(Box::new(move |ev: web::ErrorEvent| {
            log::warn!("particle worker error: {}", ev.message());
            WORKER_BROKEN.with(|b| b.set(true));
            reject_all(&q, "particle worker error");
        }) as Box<dyn FnMut(web::ErrorEvent)>);
        worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let q = pending.clone();
        let onmessageerror = Closure::wrap(Box::new(move |_ev: web::MessageEvent| {
            // Pairing is ambiguous after an undeliverable message; treat the
            // worker as dead rather than mismatch responses.
            log::warn!("particle worker message failed to deserialize");
            WORKER_BROKEN.with(|b| b.set(true));
            reject_all(&q, "particle worker message error");
        }) as Box<dyn FnMut(web::MessageEvent)>);
        worker.set_onmessageerror(Some(onmessageerror.as_ref().unchecked_ref()));

        Ok(Self {
            worker,
            pending,
            _onmessage: onmessage,
            _onerror: onerror,
            _onmessageerror: onmessageerror,
        })
    }

    /// Post a task and return a promise settled by the matching response (or
    /// rejected if the worker dies first).
    fn post(&self, kind: TaskKind, task: &str, data: &js_sys::Object) -> Result<js_sys::Promise> {
        if self.pending.borrow().has_failed() {
            return Err(anyhow!("particle worker failed; {task} refused"));
        }
        let msg = js_sys::Object::new();
        set(&msg, "task", &JsValue::from_str(task))?;
        set(&msg, "data", data)?;
        let q = self.pending.clone();
        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            if let Err((_, reject)) = q.borrow_mut().push(kind, (resolve, reject)) {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("particle worker failed"));
            }
        });
        self.worker
            .post_message(&msg)
            .map_err(|e| anyhow!("post_message: {e:?}"))?;
        Ok(promise)
    }

    fn terminate(&self, reason: &str) {
        self.worker.set_onmessage(None);
        self.worker.set_onerror(None);
        self.worker.set_onmessageerror(None);
        self.worker.terminate();
        reject_all(&self.pending, reason);
    }
}

fn reject_all(pending: &Rc<RefCell<PendingQueues<PromiseHandles>>>, reason: &str) {
    for (_resolve, reject) in pending.borrow_mut().fail() {
        let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(reason));
    }
}

impl Drop for WorkerCompute {
    fn drop(&mut self) {
        self.terminate("particle worker dropped");
    }
}

impl ComputeBackend for WorkerCompute {
    fn generate_initial_data(
        &self,
        req: InitialDataRequest,
    ) -> LocalBoxFuture<Result<InitialData>> {
        let promise = (|| -> Result<js_sys::Promise> {
            let color = js_sys::Object::new();
            set(&color, "h", &req.base.h.into())?;
            set(&color, "s", &req.base.s.into())?;
            set(&color, "l", &req.base.l.into())?;
            let data = js_sys::Object::new();
            set(&data, "count", &(req.count as u32).into())?;
            set(&data, "range", &req.range.into())?;
            set(&data, "minOpacity", &req.min_opacity.into())?;
            set(&data, "maxOpacity", &req.max_opacity.into())?;
            set(&data, "color", &color)?;
            self.post(TaskKind::InitialData, "generateInitialData", &data)
        })();
        let count = req.count;
        Box::pin(async move {
            let value = JsFuture::from(promise?)
                .await
                .map_err(|e| anyhow!("worker response: {e:?}"))?;
            let data = InitialData {
                positions: f32_field(&value, "positions")?,
                scales: f32_field(&value, "scales")?,
                phases: f32_field(&value, "phases")?,
                speeds: f32_field(&value, "speeds")?,
                opacities: f32_field(&value, "opacities")?,
                colors: f32_field(&value, "colors")?,
            };
            if data.positions.len() != count * 3 || data.scales.len() != count {
                return Err(anyhow!(
                    "worker returned {} positions / {} scales for {count} instances",
                    data.positions.len(),
                    data.scales.len()
                ));
            }
            Ok(data)
        })
    }

    fn update_animation_data(
        &self,
        req: PaletteRequest,
    ) -> LocalBoxFuture<Result<PaletteResponse>> {
        let promise = (|| -> Result<js_sys::Promise> {
            let data = js_sys::Object::new();
            set(&data, "time", &req.time.into())?;
            set(&data, "delta", &req.delta.into())?;
            set(&data, "groupCount", &(req.group_count as u32).into())?;
            set(&data, "baseHue", &req.base_hue.into())?;
            set(&data, "hueRange", &req.hue_range.into())?;
            set(&data, "speed", &req.speed.into())?;
            self.post(TaskKind::Palette, "updateAnimationData", &data)
        })();
        Box::pin(async move {
            let value = JsFuture::from(promise?)
                .await
                .map_err(|e| anyhow!("worker response: {e:?}"))?;
            let time = js_sys::Reflect::get(&value, &JsValue::from_str("time"))
                .ok()
                .and_then(|v| v.as_f64())
                .context("palette response missing time")? as f32;
            let raw = js_sys::Reflect::get(&value, &JsValue::from_str("colors"))
                .map_err(|e| anyhow!("palette response missing colors: {e:?}"))?;
            let rows = js_sys::Array::from(&raw);
            let mut colors = Vec::with_capacity(rows.length() as usize);
            for row in rows.iter() {
                let rgb = js_sys::Array::from(&row);
                let channel = |i| rgb.get(i).as_f64().unwrap_or(0.0) as f32;
                colors.push([channel(0), channel(1), channel(2)]);
            }
            Ok(PaletteResponse { time, colors })
        })
    }

    fn shutdown(&self) {
        self.terminate("particle worker shut down");
    }
}

#[inline]
fn set(obj: &js_sys::Object, key: &str, value: &JsValue) -> Result<()> {
    js_sys::Reflect::set(obj, &JsValue::from_str(key), value)
        .map_err(|e| anyhow!("reflect set {key}: {e:?}"))?;
    Ok(())
}

fn f32_field(obj: &JsValue, key: &str) -> Result<Vec<f32>> {
    let value = js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .map_err(|e| anyhow!("missing field {key}: {e:?}"))?;
    Ok(js_sys::Float32Array::new(&value).to_vec())
}

/// Worker body. The math mirrors `sim.rs` exactly, including the
/// volume-uniform sphere sampling; keep the two in lockstep.
const WORKER_JS: &str = r#"
self.onmessage = function (e) {
  const { task, data } = e.data;
  switch (task) {
    case 'generateInitialData':
      self.postMessage({ task, result: generateInitialData(data) });
      break;
    case 'updateAnimationData':
      self.postMessage({ task, result: updateAnimationData(data) });
      break;
    default:
      self.postMessage({ task, error: 'unknown task' });
  }
};

function generateInitialData({ count, range, minOpacity, maxOpacity, color }) {
  const positions = new Float32Array(count * 3);
  const scales = new Float32Array(count);
  const phases = new Float32Array(count);
  const speeds = new Float32Array(count);
  const opacities = new Float32Array(count);
  const colors = new Float32Array(count * 3);

  for (let i = 0; i < count; i++) {
    // Uniform by volume: inverse-transform radius plus spherical angles.
    const radius = range * Math.cbrt(Math.random());
    const theta = Math.random() * Math.PI * 2;
    const phi = Math.acos(2 * Math.random() - 1);

    positions[i * 3] = radius * Math.sin(phi) * Math.cos(theta);
    positions[i * 3 + 1] = radius * Math.sin(phi) * Math.sin(theta);
    positions[i * 3 + 2] = radius * Math.cos(phi);

    scales[i] = Math.random() * 2 + 0.5;
    phases[i] = Math.random() * Math.PI * 2;
    speeds[i] = Math.random() * 0.01 + 0.005;
    opacities[i] = minOpacity + Math.random() * (maxOpacity - minOpacity);

    const hue = (((color.h + Math.random() * 0.1 - 0.05) % 1) + 1) % 1;
    const rgb = hslToRgb(hue, 0.7 + Math.random() * 0.3, 0.5 + Math.random() * 0.3);
    colors[i * 3] = rgb[0];
    colors[i * 3 + 1] = rgb[1];
    colors[i * 3 + 2] = rgb[2];
  }

  return { positions, scales, phases, speeds, opacities, colors };
}

function updateAnimationData({ time, delta, groupCount, baseHue, hueRange, speed }) {
  const t = time + delta * speed;
  const groups = Math.max(groupCount, 1);
  const colors = [];
  for (let i = 0; i < groups; i++) {
    const baseOffset = (((t * 0.1) % 1) + 1) % 1;
    const groupOffset = i * (hueRange / groups);
    const hue = (((baseHue + baseOffset + groupOffset) % 1) + 1) % 1;
    const saturation = 0.8 + Math.sin(t + i) * 0.1;
    const lightness = 0.5 + Math.cos(t * 0.7 + i) * 0.15;
    colors.push(hslToRgb(hue, saturation, lightness));
  }
  return { time: t, colors };
}

function hslToRgb(h, s, l) {
  if (s === 0) return [l, l, l];
  const hue2rgb = (p, q, t) => {
    if (t < 0) t += 1;
    if (t > 1) t -= 1;
    if (t < 1 / 6) return p + (q - p) * 6 * t;
    if (t < 1 / 2) return q;
    if (t < 2 / 3) return p + (q - p) * (2 / 3 - t) * 6;
    return p;
  };
  const q = l < 0.5 ? l * (1 + s) : l + s - l * s;
  const p = 2 * l - q;
  return [hue2rgb(p, q, h + 1 / 3), hue2rgb(p, q, h), hue2rgb(p, q, h - 1 / 3)];
}
"#;
