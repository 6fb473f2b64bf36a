// Pure particle math: initial instance-attribute generation, palette drift
// and HSL/RGB conversions.
//
// Everything here is platform-free so it can run on the compute worker's
// thread, inline on the main thread as the fallback path, and under
// host-side tests. Randomness is injected so tests can seed it.

use rand::prelude::*;

/// Hue/saturation/lightness, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Per-instance attribute arrays for one particle group. Positions and colors
/// are flat `xyz` / `rgb` triples; the remaining arrays hold one value per
/// instance.
#[derive(Clone, Debug, Default)]
pub struct InitialData {
    pub positions: Vec<f32>,
    pub scales: Vec<f32>,
    pub phases: Vec<f32>,
    pub speeds: Vec<f32>,
    pub opacities: Vec<f32>,
    pub colors: Vec<f32>,
}

/// Generate rest attributes for `count` instances.
///
/// Rest positions are sampled uniformly *by volume* inside the sphere of the
/// given range: radius via inverse-transform sampling (`range * u^(1/3)`),
/// direction from uniform spherical angles. Sampling the radius linearly
/// would cluster instances toward the center.
pub fn generate_initial_data<R: Rng>(
    rng: &mut R,
    count: usize,
    range: f32,
    min_opacity: f32,
    max_opacity: f32,
    base: Hsl,
) -> InitialData {
    let mut data = InitialData {
        positions: Vec::with_capacity(count * 3),
        scales: Vec::with_capacity(count),
        phases: Vec::with_capacity(count),
        speeds: Vec::with_capacity(count),
        opacities: Vec::with_capacity(count),
        colors: Vec::with_capacity(count * 3),
    };

    for _ in 0..count {
        let radius = range * rng.gen::<f32>().cbrt();
        let theta = rng.gen::<f32>() * std::f32::consts::TAU;
        let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();

        data.positions.push(radius * phi.sin() * theta.cos());
        data.positions.push(radius * phi.sin() * theta.sin());
        data.positions.push(radius * phi.cos());

        data.scales.push(rng.gen::<f32>() * 2.0 + 0.5);
        data.phases.push(rng.gen::<f32>() * std::f32::consts::TAU);
        data.speeds.push(rng.gen::<f32>() * 0.01 + 0.005);
        data.opacities
            .push(min_opacity + rng.gen::<f32>() * (max_opacity - min_opacity));

        // Subtle per-instance variation around the group base color:
        // hue +-5%, saturation 70-100%, lightness 50-80%.
        let hue = (base.h + rng.gen::<f32>() * 0.1 - 0.05).rem_euclid(1.0);
        let rgb = hsl_to_rgb(hue, 0.7 + rng.gen::<f32>() * 0.3, 0.5 + rng.gen::<f32>() * 0.3);
        data.colors.extend_from_slice(&rgb);
    }

    data
}

/// Evenly spaced initial base colors along the configured hue span, one per
/// color stop, with randomized saturation (80-100%) and lightness (50-80%).
pub fn initial_group_hsl<R: Rng>(
    rng: &mut R,
    base_hue: f32,
    hue_range: f32,
    color_stops: usize,
) -> Vec<Hsl> {
    (0..color_stops)
        .map(|i| Hsl {
            h: (base_hue + (i as f32 / color_stops as f32) * hue_range).rem_euclid(1.0),
            s: 0.8 + rng.gen::<f32>() * 0.2,
            l: 0.5 + rng.gen::<f32>() * 0.3,
        })
        .collect()
}

/// One drifted base color per group for the given shift time: the whole
/// palette rotates slowly around the hue wheel while each group keeps a fixed
/// offset inside the configured hue span. Saturation and lightness wobble
/// gently per group so layers never look flat.
pub fn shifted_palette(
    shift_time: f32,
    base_hue: f32,
    hue_range: f32,
    group_count: usize,
) -> Vec<[f32; 3]> {
    let groups = group_count.max(1);
    (0..groups)
        .map(|i| {
            let base_offset = (shift_time * 0.1).rem_euclid(1.0);
            let group_offset = i as f32 * (hue_range / groups as f32);
            let hue = (base_hue + base_offset + group_offset).rem_euclid(1.0);
            let saturation = 0.8 + (shift_time + i as f32).sin() * 0.1;
            let lightness = 0.5 + (shift_time * 0.7 + i as f32).cos() * 0.15;
            hsl_to_rgb(hue, saturation, lightness)
        })
        .collect()
}

/// Throttled per-instance sparkle: nudge instance `i` around the group base
/// color using the color-pulse phase. `pulse_factor` raises saturation and
/// lightness together.
pub fn sparkle_color(base: Hsl, index: usize, pulse_time: f32, pulse_factor: f32) -> [f32; 3] {
    let i = index as f32;
    let hue_shift = (i + pulse_time * (1.0 + i * 0.001)).sin() * 0.05;
    hsl_to_rgb(
        (base.h + hue_shift).rem_euclid(1.0),
        (base.s + pulse_factor * 0.2).min(1.0),
        (base.l + pulse_factor * 0.3).min(1.0),
    )
}

pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s == 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

pub fn rgb_to_hsl(rgb: [f32; 3]) -> Hsl {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) * 0.5;
    if (max - min).abs() < f32::EPSILON {
        return Hsl { h: 0.0, s: 0.0, l };
    }
    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if (max - r).abs() < f32::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f32::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } / 6.0;
    Hsl { h, s, l }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
