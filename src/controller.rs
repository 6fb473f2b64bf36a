//! Particle field orchestration: the initialization sequence, the
//! requestAnimationFrame loop, visibility-driven pause/resume, debounced
//! resize and teardown.
//!
//! At most one controller is active per page (process-wide flag in
//! `lifecycle`). Every asynchronous continuation is gated on a shared
//! cancellation token so resources arriving after an unmount are disposed
//! instead of installed.

use crate::compute::{
    create_backend, ComputeBackend, InitialDataRequest, PaletteRequest, PaletteResponse,
};
use crate::config::FieldOptions;
use crate::constants::{
    global_motion_for, profile_for, PerformanceProfile, PerformanceTier, COLOR_SHIFT_SPEED_SCALE,
    COLOR_SHIFT_UPDATE_INTERVAL, FOCAL_EASE_FRACTION, FOCAL_LOW_TIER_CHANCE, FOCAL_RETARGET_SECS,
    GROUP_SKIP_CHANCE_LOW, PARTICLE_GROUP_PRESETS, RESIZE_DEBOUNCE_MS,
};
use crate::dom;
use crate::group::ParticleGroup;
use crate::lifecycle::{self, Lifecycle};
use crate::motion::{ColorPulse, ColorShift, FocalPoint, FrameLimiter, GlobalMotion};
use crate::perf;
use crate::render::GpuState;
use crate::sim;
use crate::texture;
use anyhow::{anyhow, Result};
use instant::Instant;
use rand::prelude::*;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub struct ParticleFieldController {
    lifecycle: Lifecycle,
    gpu: GpuState,
    groups: SmallVec<[ParticleGroup; 4]>,
    backend: Rc<dyn ComputeBackend>,
    options: FieldOptions,
    tier: PerformanceTier,
    profile: PerformanceProfile,
    limiter: FrameLimiter,
    global_motion: GlobalMotion,
    focal: FocalPoint,
    color_pulse: ColorPulse,
    color_shift: ColorShift,
    rng: StdRng,
    epoch: Instant,
    last_frame: Instant,
    canvas: web::HtmlCanvasElement,
    pending_palette: Rc<RefCell<Option<PaletteResponse>>>,
    palette_inflight: Rc<Cell<bool>>,
    cancelled: Rc<Cell<bool>>,
}

/// Everything that must be torn down together for one active field.
struct ActiveField {
    controller: Rc<RefCell<ParticleFieldController>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    raf_id: Rc<Cell<Option<i32>>>,
    cancelled: Rc<Cell<bool>>,
    resize_closure: Closure<dyn FnMut()>,
    _resize_inner: Rc<Closure<dyn FnMut()>>,
    resize_timeout: Rc<Cell<Option<i32>>>,
    visibility_closure: Closure<dyn FnMut()>,
}

thread_local! {
    // Registry for the at-most-one-active constraint only; all field data is
    // owned by the controller itself.
    static CURRENT: RefCell<Option<ActiveField>> = RefCell::new(None);
    // Cancellation token for a mount still inside its init sequence.
    static PENDING_CANCEL: RefCell<Option<Rc<Cell<bool>>>> = RefCell::new(None);
}

/// Begin initializing a field on the given canvas. A no-op (logged) while
/// another field is initializing, running or paused.
pub fn mount(canvas: web::HtmlCanvasElement, options: FieldOptions) {
    if !lifecycle::try_acquire() {
        log::warn!("particle field already active; ignoring mount");
        return;
    }
    let cancelled = Rc::new(Cell::new(false));
    PENDING_CANCEL.with(|p| *p.borrow_mut() = Some(cancelled.clone()));

    spawn_local(async move {
        match initialize(canvas, options, cancelled.clone()).await {
            Ok(Some(controller)) => {
                PENDING_CANCEL.with(|p| p.borrow_mut().take());
                if cancelled.get() {
                    // Unmounted during the last suspension point: dispose
                    // instead of installing.
                    drop(controller);
                    lifecycle::release();
                    return;
                }
                install_and_start(controller, cancelled);
            }
            Ok(None) => {
                PENDING_CANCEL.with(|p| p.borrow_mut().take());
                lifecycle::release();
            }
            Err(e) => {
                log::error!("particle field init failed: {e:?}");
                PENDING_CANCEL.with(|p| p.borrow_mut().take());
                lifecycle::release();
            }
        }
    });
}

/// Tear the active field down (or cancel one still initializing). The sole
/// external teardown trigger.
pub fn unmount() {
    PENDING_CANCEL.with(|p| {
        if let Some(token) = p.borrow_mut().take() {
            token.set(true);
        }
    });
    if let Some(active) = CURRENT.with(|c| c.borrow_mut().take()) {
        active.teardown();
    }
}

/// Detect, load, spawn, build: strictly sequential because each step depends
/// on the previous one's output. Returns `Ok(None)` when the mount was
/// cancelled at a suspension point.
async fn initialize(
    canvas: web::HtmlCanvasElement,
    options: FieldOptions,
    cancelled: Rc<Cell<bool>>,
) -> Result<Option<Rc<RefCell<ParticleFieldController>>>> {
    let mut lc = Lifecycle::new();
    lc.begin_init();

    dom::sync_canvas_backing_size(&canvas);
    let tier = perf::detect();
    let profile = profile_for(tier);

    let sprites = texture::load_sprites().await;
    if cancelled.get() {
        return Ok(None);
    }

    let gpu = GpuState::new(canvas.clone()).await?;
    if cancelled.get() {
        return Ok(None);
    }

    let backend = create_backend();
    let mut rng = StdRng::from_entropy();
    let colors = options.colors;
    let palette = sim::initial_group_hsl(&mut rng, colors.base_hue, colors.hue_range, colors.color_stops);
    let density = options.density.multiplier();
    let motion_params = options.motion.params();

    let mut groups: SmallVec<[ParticleGroup; 4]> = SmallVec::new();
    for (index, preset) in PARTICLE_GROUP_PRESETS.iter().enumerate() {
        let count = ((profile.group_counts[index] as f32 * density) as usize).max(1);
        let base = palette[index % palette.len()];
        let data = backend
            .generate_initial_data(InitialDataRequest {
                count,
                range: preset.range,
                min_opacity: preset.min_opacity,
                max_opacity: preset.max_opacity,
                base,
            })
            .await?;
        if cancelled.get() {
            return Ok(None);
        }
        let sprite = sprites
            .get(&preset.texture_key)
            .ok_or_else(|| anyhow!("missing sprite {:?}", preset.texture_key))?;
        let view = gpu.create_sprite_view(preset.texture_key.label(), sprite);
        let group_gpu = gpu.create_group_gpu(preset.texture_key.label(), count, &view);
        groups.push(ParticleGroup::build(
            &mut rng,
            index,
            preset,
            motion_params,
            &data,
            base,
            group_gpu,
            gpu.queue(),
        ));
    }

    let (amplitude, speed) = global_motion_for(tier);
    let now = Instant::now();
    Ok(Some(Rc::new(RefCell::new(ParticleFieldController {
        lifecycle: lc,
        gpu,
        groups,
        backend,
        options,
        tier,
        profile,
        limiter: FrameLimiter::new(profile.target_fps),
        global_motion: GlobalMotion::new(amplitude, speed),
        focal: FocalPoint::new(&mut rng, FOCAL_RETARGET_SECS, FOCAL_EASE_FRACTION),
        color_pulse: ColorPulse::new(motion_params.pulse),
        color_shift: ColorShift::new(
            colors.transition_speed,
            COLOR_SHIFT_SPEED_SCALE,
            COLOR_SHIFT_UPDATE_INTERVAL,
        ),
        rng,
        epoch: now,
        last_frame: now,
        canvas,
        pending_palette: Rc::new(RefCell::new(None)),
        palette_inflight: Rc::new(Cell::new(false)),
        cancelled,
    }))))
}

fn install_and_start(controller: Rc<RefCell<ParticleFieldController>>, cancelled: Rc<Cell<bool>>) {
    controller.borrow_mut().lifecycle.mark_running();

    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

    {
        let controller = controller.clone();
        let tick_rearm = tick.clone();
        let raf_rearm = raf_id.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            raf_rearm.set(None);
            if controller.borrow_mut().frame() {
                arm(&tick_rearm, &raf_rearm);
            }
        }) as Box<dyn FnMut()>));
    }

    // Debounced resize: resync the canvas backing store after the window
    // settles; the frame loop picks the new size up on its next pass.
    let resize_timeout: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let resize_inner: Rc<Closure<dyn FnMut()>> = {
        let canvas = controller.borrow().canvas.clone();
        Rc::new(Closure::wrap(Box::new(move || {
            dom::sync_canvas_backing_size(&canvas);
        }) as Box<dyn FnMut()>))
    };
    let resize_closure = {
        let timeout = resize_timeout.clone();
        let inner = resize_inner.clone();
        Closure::wrap(Box::new(move || {
            if let Some(w) = web::window() {
                if let Some(id) = timeout.take() {
                    w.clear_timeout_with_handle(id);
                }
                if let Ok(id) = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                    (*inner).as_ref().unchecked_ref(),
                    RESIZE_DEBOUNCE_MS,
                ) {
                    timeout.set(Some(id));
                }
            }
        }) as Box<dyn FnMut()>)
    };
    if let Some(w) = web::window() {
        let _ = w
            .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref());
    }

    // Pause when the page is hidden, resume with a fresh delta baseline when
    // it becomes visible again.
    let visibility_closure = {
        let controller = controller.clone();
        let tick = tick.clone();
        let raf = raf_id.clone();
        Closure::wrap(Box::new(move || {
            let hidden = dom::window_document().map(|d| d.hidden()).unwrap_or(false);
            if hidden {
                if controller.borrow_mut().pause() {
                    if let (Some(w), Some(id)) = (web::window(), raf.take()) {
                        w.cancel_animation_frame(id).ok();
                    }
                }
            } else if controller.borrow_mut().resume() {
                arm(&tick, &raf);
            }
        }) as Box<dyn FnMut()>)
    };
    if let Some(d) = dom::window_document() {
        let _ = d.add_event_listener_with_callback(
            "visibilitychange",
            visibility_closure.as_ref().unchecked_ref(),
        );
    }

    arm(&tick, &raf_id);

    CURRENT.with(|c| {
        *c.borrow_mut() = Some(ActiveField {
            controller,
            tick,
            raf_id,
            cancelled,
            resize_closure,
            _resize_inner: resize_inner,
            resize_timeout,
            visibility_closure,
        });
    });
    log::info!("particle field running");
}

fn arm(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>, raf_id: &Rc<Cell<Option<i32>>>) {
    if let Some(w) = web::window() {
        if let Some(cb) = tick.borrow().as_ref() {
            if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                raf_id.set(Some(id));
            }
        }
    }
}

impl ParticleFieldController {
    /// One scheduled frame. Returns whether the loop should re-arm.
    fn frame(&mut self) -> bool {
        if !self.lifecycle.is_running() {
            return false;
        }
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        if !self.limiter.should_run(now_ms) {
            // Under the tier's frame budget: reschedule without doing work.
            return true;
        }
        let now = Instant::now();
        let delta = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.global_motion.advance(delta);
        self.color_pulse.advance(delta);

        // A palette response applies whenever it has arrived; eventually
        // consistent with the frame loop, never awaited by it.
        if let Some(resp) = self.pending_palette.borrow_mut().take() {
            self.color_shift.time = resp.time;
            for (group, rgb) in self.groups.iter_mut().zip(resp.colors.iter()) {
                group.set_base_color(*rgb);
            }
        }
        if self.color_shift.tick(delta) && !self.palette_inflight.get() {
            self.request_palette();
        }

        if self.tier != PerformanceTier::Low || self.rng.gen::<f32>() < FOCAL_LOW_TIER_CHANCE {
            self.focal.step(delta, &mut self.rng);
        }

        let width = self.canvas.width();
        let height = self.canvas.height();
        self.gpu.resize_if_needed(width, height);

        let queue = self.gpu.queue();
        for (index, group) in self.groups.iter_mut().enumerate() {
            // Low-tier shedding: sometimes skip whole secondary layers.
            if self.tier == PerformanceTier::Low
                && index > 0
                && self.rng.gen::<f32>() < GROUP_SKIP_CHANCE_LOW
            {
                continue;
            }
            group.update(
                queue,
                &mut self.rng,
                delta,
                &self.focal,
                &self.global_motion,
                &self.color_pulse,
                self.profile.update_fraction,
            );
        }

        match self.gpu.render(&self.groups) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                true
            }
            Err(e) => {
                log::error!("render error: {e:?}; stopping particle loop");
                false
            }
        }
    }

    /// Kick off a throttled palette recompute on the backend. The response
    /// lands in `pending_palette` and is applied by a later frame.
    fn request_palette(&mut self) {
        let colors = self.options.colors;
        let req = PaletteRequest {
            time: self.color_shift.time,
            delta: self.color_shift.pending_advance(),
            group_count: self.groups.len(),
            base_hue: colors.base_hue,
            hue_range: colors.hue_range,
            speed: self.color_shift.speed,
        };
        let backend = self.backend.clone();
        let slot = self.pending_palette.clone();
        let inflight = self.palette_inflight.clone();
        let cancelled = self.cancelled.clone();
        inflight.set(true);
        spawn_local(async move {
            let result = backend.update_animation_data(req).await;
            inflight.set(false);
            if cancelled.get() {
                return;
            }
            match result {
                Ok(resp) => *slot.borrow_mut() = Some(resp),
                Err(e) => log::warn!("palette update failed: {e:?}"),
            }
        });
    }

    fn pause(&mut self) -> bool {
        self.lifecycle.on_hidden()
    }

    fn resume(&mut self) -> bool {
        if !self.lifecycle.on_visible() {
            return false;
        }
        // Fresh baselines: the paused interval must not turn into one huge
        // delta on the first resumed frame.
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.limiter.reset(now_ms);
        self.last_frame = Instant::now();
        true
    }
}

impl ActiveField {
    fn teardown(self) {
        {
            let mut controller = self.controller.borrow_mut();
            if !controller.lifecycle.begin_teardown() {
                return;
            }
            self.cancelled.set(true);

            if let Some(w) = web::window() {
                if let Some(id) = self.raf_id.take() {
                    w.cancel_animation_frame(id).ok();
                }
                if let Some(id) = self.resize_timeout.take() {
                    w.clear_timeout_with_handle(id);
                }
                let _ = w.remove_event_listener_with_callback(
                    "resize",
                    self.resize_closure.as_ref().unchecked_ref(),
                );
            }
            if let Some(d) = dom::window_document() {
                let _ = d.remove_event_listener_with_callback(
                    "visibilitychange",
                    self.visibility_closure.as_ref().unchecked_ref(),
                );
            }

            controller.groups.clear();
            // Terminate the worker now rather than whenever the last backend
            // reference drops; in-flight requests reject immediately.
            controller.backend.shutdown();
            controller.lifecycle.finish_teardown();
        }
        // Dropping `self` releases the frame closure, the controller (and
        // with it the GPU state and the compute worker) and the listeners.
        drop(self.tick.borrow_mut().take());
        drop(self);
        lifecycle::release();
        log::info!("particle field destroyed");
    }
}
