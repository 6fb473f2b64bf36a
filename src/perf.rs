// One-shot device-capability detection.
//
// Samples hardware-concurrency and device-memory signals from the browser;
// both are optional and absence leans toward the middle tier. Classification
// itself is a pure function so the thresholds are testable on the host.

use crate::constants::PerformanceTier;

/// Classify optional hardware signals into a tier. Missing signals are
/// treated as a mid-range machine rather than penalized.
pub fn classify(cores: Option<f64>, memory_gb: Option<f64>) -> PerformanceTier {
    let cores = cores.unwrap_or(4.0);
    let memory_gb = memory_gb.unwrap_or(4.0);
    if cores <= 2.0 || memory_gb <= 2.0 {
        PerformanceTier::Low
    } else if cores >= 8.0 && memory_gb >= 8.0 {
        PerformanceTier::High
    } else {
        PerformanceTier::Normal
    }
}

/// Sample the host signals once. Side-effect-free and infallible: any missing
/// API simply yields `None` for that signal.
#[cfg(target_arch = "wasm32")]
pub fn detect() -> PerformanceTier {
    let navigator = web_sys::window().map(|w| w.navigator());
    let cores = navigator.as_ref().map(|n| n.hardware_concurrency());
    // `deviceMemory` is not exposed by every browser; read it reflectively.
    let memory_gb = navigator.as_ref().and_then(|n| {
        js_sys::Reflect::get(n.as_ref(), &wasm_bindgen::JsValue::from_str("deviceMemory"))
            .ok()
            .and_then(|v| v.as_f64())
    });
    let tier = classify(cores, memory_gb);
    log::info!(
        "performance tier {:?} (cores {:?}, memory {:?} GB)",
        tier,
        cores,
        memory_gb
    );
    tier
}
