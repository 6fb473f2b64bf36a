// Host-side tests for the pure particle math.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod sim {
    include!("../src/sim.rs");
}

use rand::rngs::StdRng;
use rand::SeedableRng;
use sim::*;

const EPS: f32 = 1e-5;

fn base() -> Hsl {
    Hsl {
        h: 0.6,
        s: 0.9,
        l: 0.6,
    }
}

#[test]
fn initial_data_has_one_entry_per_instance() {
    let mut rng = StdRng::seed_from_u64(7);
    let data = generate_initial_data(&mut rng, 100, 5.0, 0.1, 0.8, base());
    assert_eq!(data.positions.len(), 300);
    assert_eq!(data.colors.len(), 300);
    assert_eq!(data.scales.len(), 100);
    assert_eq!(data.phases.len(), 100);
    assert_eq!(data.speeds.len(), 100);
    assert_eq!(data.opacities.len(), 100);
}

#[test]
fn initial_attributes_stay_in_their_documented_ranges() {
    let mut rng = StdRng::seed_from_u64(11);
    let range = 4.0;
    let data = generate_initial_data(&mut rng, 500, range, 0.06, 0.3, base());
    for p in data.positions.chunks_exact(3) {
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!(r <= range + EPS, "instance outside sphere: r = {r}");
    }
    for &s in &data.scales {
        assert!((0.5..=2.5).contains(&s));
    }
    for &p in &data.phases {
        assert!((0.0..=std::f32::consts::TAU).contains(&p));
    }
    for &s in &data.speeds {
        assert!((0.005..=0.015).contains(&s));
    }
    for &o in &data.opacities {
        assert!((0.06 - EPS..=0.3 + EPS).contains(&o));
    }
    for &c in &data.colors {
        assert!((0.0..=1.0).contains(&c));
    }
}

#[test]
fn rest_positions_are_uniform_by_volume_not_by_radius() {
    // For volume-uniform sampling the inner half-radius sphere holds an
    // eighth of the instances; radius-linear sampling would put half there.
    let mut rng = StdRng::seed_from_u64(23);
    let range = 6.0;
    let count = 4000;
    let data = generate_initial_data(&mut rng, count, range, 0.1, 0.5, base());
    let inner = data
        .positions
        .chunks_exact(3)
        .filter(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt() < range * 0.5)
        .count();
    let fraction = inner as f32 / count as f32;
    assert!(
        (0.09..=0.16).contains(&fraction),
        "inner-half fraction {fraction} is not volume-uniform"
    );
}

#[test]
fn initial_palette_spaces_hues_across_the_configured_span() {
    let mut rng = StdRng::seed_from_u64(3);
    let palette = initial_group_hsl(&mut rng, 0.5, 0.3, 5);
    assert_eq!(palette.len(), 5);
    for (i, hsl) in palette.iter().enumerate() {
        let expected = 0.5 + (i as f32 / 5.0) * 0.3;
        assert!((hsl.h - expected).abs() < EPS);
        assert!((0.8..=1.0).contains(&hsl.s));
        assert!((0.5..=0.8).contains(&hsl.l));
    }
}

#[test]
fn initial_palette_wraps_hues_around_the_wheel() {
    let mut rng = StdRng::seed_from_u64(3);
    let palette = initial_group_hsl(&mut rng, 0.9, 0.5, 4);
    for hsl in &palette {
        assert!((0.0..1.0).contains(&hsl.h));
    }
    // 0.9 + (3/4) * 0.5 wraps to 0.275.
    assert!((palette[3].h - 0.275).abs() < EPS);
}

#[test]
fn shifted_palette_yields_one_color_per_group() {
    let colors = shifted_palette(12.5, 0.55, 0.25, 3);
    assert_eq!(colors.len(), 3);
    for rgb in &colors {
        for &c in rgb {
            assert!((0.0..=1.0).contains(&c), "channel out of range: {c}");
        }
    }
    // Zero groups still produces a single color rather than panicking.
    assert_eq!(shifted_palette(0.0, 0.55, 0.25, 0).len(), 1);
}

#[test]
fn shifted_palette_drifts_with_time() {
    let early = shifted_palette(0.0, 0.55, 0.25, 3);
    let late = shifted_palette(2.0, 0.55, 0.25, 3);
    assert_ne!(early, late);
}

#[test]
fn sparkle_color_stays_in_gamut() {
    let b = base();
    for index in 0..50 {
        let rgb = sparkle_color(b, index, 3.7, 0.2);
        for &c in &rgb {
            assert!((0.0..=1.0).contains(&c));
        }
    }
}

#[test]
fn hsl_rgb_conversions_agree_on_primaries() {
    assert_eq!(hsl_to_rgb(0.0, 0.0, 0.5), [0.5, 0.5, 0.5]);
    let red = hsl_to_rgb(0.0, 1.0, 0.5);
    assert!((red[0] - 1.0).abs() < EPS && red[1].abs() < EPS && red[2].abs() < EPS);
    let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
    assert!(green[1] > 0.99 && green[0] < 0.01 && green[2] < 0.01);
}

#[test]
fn rgb_to_hsl_round_trips() {
    for &(h, s, l) in &[(0.12, 0.8, 0.4), (0.55, 0.9, 0.6), (0.83, 0.6, 0.7)] {
        let rgb = hsl_to_rgb(h, s, l);
        let back = rgb_to_hsl(rgb);
        assert!((back.h - h).abs() < 1e-3, "hue {h} came back as {}", back.h);
        assert!((back.s - s).abs() < 1e-3);
        assert!((back.l - l).abs() < 1e-3);
    }
}
