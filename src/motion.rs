// Global motion state advanced once per frame: frame-rate capping, the
// whole-field breathing drift, the wandering focal point and the two
// throttled color clocks. Platform-free; tested host-side.

use rand::prelude::*;

/// Caps the frame loop to a target rate. `should_run` answers whether enough
/// wall-clock time has passed since the last executed frame; when it has, the
/// baseline carries the remainder so the cadence does not drift.
#[derive(Clone, Copy, Debug)]
pub struct FrameLimiter {
    interval_ms: f64,
    last_ms: f64,
}

impl FrameLimiter {
    pub fn new(target_fps: f32) -> Self {
        Self {
            interval_ms: 1000.0 / f64::from(target_fps.max(1.0)),
            last_ms: 0.0,
        }
    }

    pub fn should_run(&mut self, now_ms: f64) -> bool {
        let elapsed = now_ms - self.last_ms;
        if elapsed < self.interval_ms {
            return false;
        }
        self.last_ms = now_ms - (elapsed % self.interval_ms);
        true
    }

    /// Re-baseline after a pause so the first resumed frame is not capped.
    pub fn reset(&mut self, now_ms: f64) {
        self.last_ms = now_ms - self.interval_ms;
    }
}

/// Slow sinusoidal perturbation applied identically (with per-instance phase
/// spacing) across every group.
#[derive(Clone, Copy, Debug)]
pub struct GlobalMotion {
    pub time: f32,
    pub amplitude: f32,
    pub speed: f32,
}

impl GlobalMotion {
    pub fn new(amplitude: f32, speed: f32) -> Self {
        Self {
            time: 0.0,
            amplitude,
            speed,
        }
    }

    pub fn advance(&mut self, delta: f32) {
        self.time += delta * self.speed;
    }

    /// Breathing offset for instance `index`; `phase_spacing` decorrelates
    /// neighbouring instances.
    pub fn offset(&self, index: usize, phase_spacing: f32) -> [f32; 3] {
        let p = index as f32 * phase_spacing;
        [
            (self.time + p).sin() * self.amplitude,
            (self.time * 1.3 + p).cos() * self.amplitude,
            (self.time * 0.7 + p).sin() * self.amplitude,
        ]
    }
}

/// A wandering attraction target. Every `retarget_secs` a new random point
/// inside `[-1, 1]^3` is chosen; the current point eases toward it by a fixed
/// fraction per frame. Exponential smoothing is deliberate: the point never
/// snaps onto its target, which keeps the drift organic.
#[derive(Clone, Copy, Debug)]
pub struct FocalPoint {
    pub current: [f32; 3],
    pub target: [f32; 3],
    pub change_time: f32,
    retarget_secs: f32,
    ease_fraction: f32,
}

impl FocalPoint {
    pub fn new<R: Rng>(rng: &mut R, retarget_secs: f32, ease_fraction: f32) -> Self {
        Self {
            current: [0.0; 3],
            target: random_cube_point(rng),
            change_time: 0.0,
            retarget_secs,
            ease_fraction,
        }
    }

    pub fn step<R: Rng>(&mut self, delta: f32, rng: &mut R) {
        self.change_time += delta;
        if self.change_time > self.retarget_secs {
            self.target = random_cube_point(rng);
            self.change_time = 0.0;
        }
        for axis in 0..3 {
            self.current[axis] += (self.target[axis] - self.current[axis]) * self.ease_fraction;
        }
    }
}

fn random_cube_point<R: Rng>(rng: &mut R) -> [f32; 3] {
    [
        (rng.gen::<f32>() - 0.5) * 2.0,
        (rng.gen::<f32>() - 0.5) * 2.0,
        (rng.gen::<f32>() - 0.5) * 2.0,
    ]
}

/// Clock for the throttled palette recompute. `tick` accumulates frame time
/// and reports `true` once per update interval; the palette itself is
/// computed elsewhere (worker or inline).
#[derive(Clone, Copy, Debug)]
pub struct ColorShift {
    pub time: f32,
    pub speed: f32,
    pub last_update_time: f32,
    pub update_interval: f32,
}

impl ColorShift {
    pub fn new(transition_speed: f32, speed_scale: f32, update_interval: f32) -> Self {
        Self {
            time: 0.0,
            speed: transition_speed * speed_scale,
            last_update_time: 0.0,
            update_interval,
        }
    }

    pub fn tick(&mut self, delta: f32) -> bool {
        self.last_update_time += delta;
        if self.last_update_time >= self.update_interval {
            self.last_update_time = 0.0;
            return true;
        }
        false
    }

    /// Seconds of shift-clock advance covered by one palette recompute.
    pub fn pending_advance(&self) -> f32 {
        self.update_interval
    }
}

/// Phase clock for the per-instance sparkle recolor.
#[derive(Clone, Copy, Debug)]
pub struct ColorPulse {
    pub time: f32,
    pub speed: f32,
    pub intensity: f32,
}

impl ColorPulse {
    pub fn new(pulse_multiplier: f32) -> Self {
        Self {
            time: 0.0,
            speed: 0.3 * pulse_multiplier,
            intensity: 0.2 * pulse_multiplier,
        }
    }

    pub fn advance(&mut self, delta: f32) {
        self.time += delta * self.speed;
    }

    pub fn factor(&self) -> f32 {
        self.time.sin() * self.intensity
    }
}
