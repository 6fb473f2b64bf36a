// Host-side tests for the per-frame motion state: frame capping, the
// wandering focal point and the throttled color clocks.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod motion {
    include!("../src/motion.rs");
}

use motion::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn frame_limiter_blocks_until_the_interval_has_passed() {
    // 50 fps => one frame per 20 ms.
    let mut limiter = FrameLimiter::new(50.0);
    assert!(!limiter.should_run(5.0));
    assert!(limiter.should_run(20.0));
    assert!(!limiter.should_run(30.0));
    assert!(limiter.should_run(41.0));
}

#[test]
fn frame_limiter_carries_the_remainder_so_cadence_does_not_drift() {
    let mut limiter = FrameLimiter::new(50.0);
    // Frames arrive slightly late; the baseline snaps back to the grid, so
    // the next slot is still reachable at its nominal time.
    assert!(limiter.should_run(21.0));
    assert!(limiter.should_run(40.0));
    assert!(limiter.should_run(60.5));
    assert!(!limiter.should_run(79.0));
    assert!(limiter.should_run(80.0));
}

#[test]
fn frame_limiter_reset_lets_the_next_frame_through() {
    let mut limiter = FrameLimiter::new(60.0);
    assert!(limiter.should_run(100.0));
    limiter.reset(5000.0);
    assert!(limiter.should_run(5000.0));
}

#[test]
fn focal_point_eases_toward_its_target_without_overshoot() {
    let mut rng = StdRng::seed_from_u64(42);
    // Long retarget horizon: the target stays fixed for this test.
    let mut focal = FocalPoint::new(&mut rng, 1.0e6, 0.1);
    let target = focal.target;
    let mut previous: [f32; 3] = std::array::from_fn(|a| (target[a] - focal.current[a]).abs());
    for _ in 0..200 {
        focal.step(0.016, &mut rng);
        for axis in 0..3 {
            let remaining = (target[axis] - focal.current[axis]).abs();
            assert!(
                remaining <= previous[axis] + f32::EPSILON,
                "axis {axis} moved away from its target"
            );
            previous[axis] = remaining;
        }
    }
    // Exponential smoothing converges but never snaps exactly onto the
    // target.
    for axis in 0..3 {
        assert!(previous[axis] < 0.01 * target[axis].abs().max(0.1));
    }
}

#[test]
fn focal_point_retargets_on_schedule() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut focal = FocalPoint::new(&mut rng, 1.0, 0.01);
    let first_target = focal.target;
    focal.step(0.4, &mut rng);
    focal.step(0.4, &mut rng);
    assert_eq!(focal.target, first_target);
    // Crossing the horizon picks a fresh target and restarts the clock.
    focal.step(0.4, &mut rng);
    assert_ne!(focal.target, first_target);
    assert_eq!(focal.change_time, 0.0);
    for axis in 0..3 {
        assert!((-1.0..=1.0).contains(&focal.target[axis]));
    }
}

#[test]
fn color_shift_fires_once_per_interval() {
    let mut shift = ColorShift::new(1.0, 0.1, 0.5);
    assert!((shift.speed - 0.1).abs() < 1e-6);
    assert!(!shift.tick(0.2));
    assert!(!shift.tick(0.2));
    assert!(shift.tick(0.2));
    assert!(!shift.tick(0.4));
    assert!(shift.tick(0.1));
    assert!((shift.pending_advance() - 0.5).abs() < 1e-6);
}

#[test]
fn global_motion_time_scales_with_speed() {
    let mut motion = GlobalMotion::new(0.5, 2.0);
    motion.advance(0.25);
    assert!((motion.time - 0.5).abs() < 1e-6);
    let [x, y, z] = motion.offset(0, 0.0);
    assert!((x - 0.5_f32.sin() * 0.5).abs() < 1e-6);
    assert!((y - 0.65_f32.cos() * 0.5).abs() < 1e-6);
    assert!((z - 0.35_f32.sin() * 0.5).abs() < 1e-6);
}

#[test]
fn global_motion_phase_spacing_decorrelates_instances() {
    let mut motion = GlobalMotion::new(1.0, 1.0);
    motion.advance(1.0);
    assert_ne!(motion.offset(0, 0.01), motion.offset(100, 0.01));
}

#[test]
fn color_pulse_factor_is_bounded_by_its_intensity() {
    let mut pulse = ColorPulse::new(1.3);
    let intensity = 0.2 * 1.3;
    for _ in 0..100 {
        pulse.advance(0.1);
        assert!(pulse.factor().abs() <= intensity + 1e-6);
    }
}
