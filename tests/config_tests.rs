// Host-side tests for option parsing, the tier profiles and capability
// classification.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod config {
    include!("../src/config.rs");
}
mod constants {
    include!("../src/constants.rs");
}
mod perf {
    include!("../src/perf.rs");
}

use config::*;
use constants::*;

#[test]
fn density_parse_defaults_to_high() {
    assert_eq!(Density::parse(None), Density::High);
    assert_eq!(Density::parse(Some("low")), Density::Low);
    assert_eq!(Density::parse(Some("normal")), Density::Normal);
    assert_eq!(Density::parse(Some("high")), Density::High);
    assert_eq!(Density::parse(Some("garbage")), Density::High);
}

#[test]
fn motion_parse_defaults_to_high() {
    assert_eq!(MotionIntensity::parse(None), MotionIntensity::High);
    assert_eq!(MotionIntensity::parse(Some("low")), MotionIntensity::Low);
    assert_eq!(MotionIntensity::parse(Some("nope")), MotionIntensity::High);
}

#[test]
fn motion_params_order_by_intensity() {
    let low = MotionIntensity::Low.params();
    let normal = MotionIntensity::Normal.params();
    let high = MotionIntensity::High.params();
    assert!(low.wave < normal.wave && normal.wave < high.wave);
    assert!(low.rotation < normal.rotation && normal.rotation < high.rotation);
    assert!(low.pulse < normal.pulse && normal.pulse < high.pulse);
}

#[test]
fn color_overrides_merge_over_defaults() {
    let d = ColorTransition::default();
    let merged = ColorTransition::with_overrides(Some(0.2), None, None, Some(7));
    assert!((merged.base_hue - 0.2).abs() < 1e-6);
    assert!((merged.hue_range - d.hue_range).abs() < 1e-6);
    assert!((merged.transition_speed - d.transition_speed).abs() < 1e-6);
    assert_eq!(merged.color_stops, 7);
}

#[test]
fn color_overrides_are_sanitized() {
    let c = ColorTransition::with_overrides(Some(1.3), Some(2.0), Some(-1.0), Some(0));
    assert!((c.base_hue - 0.3).abs() < 1e-5, "hue wraps around the wheel");
    assert!((c.hue_range - 1.0).abs() < 1e-6, "range clamps to the wheel");
    assert_eq!(c.transition_speed, 0.0, "speed never goes negative");
    assert_eq!(c.color_stops, 1, "at least one stop");
}

#[test]
fn tier_profiles_scale_together() {
    let low = profile_for(PerformanceTier::Low);
    let normal = profile_for(PerformanceTier::Normal);
    let high = profile_for(PerformanceTier::High);
    assert!(low.target_fps < normal.target_fps && normal.target_fps < high.target_fps);
    for i in 0..3 {
        assert!(low.group_counts[i] < normal.group_counts[i]);
        assert!(normal.group_counts[i] < high.group_counts[i]);
    }
    assert!(low.update_fraction < normal.update_fraction);
    assert!(normal.update_fraction < high.update_fraction);
    assert!(high.update_fraction <= 1.0);
}

#[test]
fn density_multiplier_orders_total_instance_counts() {
    let profile = profile_for(PerformanceTier::Normal);
    let total = |density: Density| -> usize {
        profile
            .group_counts
            .iter()
            .map(|&c| ((c as f32 * density.multiplier()) as usize).max(1))
            .sum()
    };
    assert!(total(Density::Low) < total(Density::Normal));
    assert!(total(Density::Normal) < total(Density::High));
}

#[test]
fn capability_classification_thresholds() {
    use constants::PerformanceTier::*;
    assert_eq!(perf::classify(Some(2.0), Some(8.0)), Low);
    assert_eq!(perf::classify(Some(8.0), Some(1.0)), Low);
    assert_eq!(perf::classify(Some(8.0), Some(8.0)), High);
    assert_eq!(perf::classify(Some(16.0), Some(4.0)), Normal);
    assert_eq!(perf::classify(None, None), Normal, "unknown hardware lands mid-tier");
    assert_eq!(perf::classify(Some(4.0), None), Normal);
    assert_eq!(perf::classify(None, Some(16.0)), Normal);
}

#[test]
fn group_presets_cover_the_three_sprite_layers() {
    assert_eq!(PARTICLE_GROUP_PRESETS.len(), 3);
    let keys: Vec<_> = PARTICLE_GROUP_PRESETS.iter().map(|p| p.texture_key).collect();
    assert!(keys.contains(&TextureKey::Glow));
    assert!(keys.contains(&TextureKey::Orb));
    assert!(keys.contains(&TextureKey::Spark));
    for preset in &PARTICLE_GROUP_PRESETS {
        assert!(preset.range > 0.0);
        assert!(preset.min_opacity < preset.max_opacity);
        assert!(preset.max_opacity <= 1.0);
    }
}

#[test]
fn global_motion_is_gentler_on_the_low_tier() {
    let (low_amp, low_speed) = global_motion_for(PerformanceTier::Low);
    let (amp, speed) = global_motion_for(PerformanceTier::High);
    assert!(low_amp < amp);
    assert!(low_speed < speed);
}
