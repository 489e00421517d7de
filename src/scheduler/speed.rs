/// Speed percentage to milliseconds-per-pixel breakpoints.
/// Tuned by eye on the panel; treat as policy.
pub const SPEED_CURVE: [(f64, f64); 6] = [
    (10.0, 50.0),
    (20.0, 30.0),
    (40.0, 20.0),
    (60.0, 12.0),
    (80.0, 6.0),
    (100.0, 2.0),
];

/// Fastest step the device firmware accepts
pub const MIN_STEP_MS: f64 = 2.0;
/// Slowest step the device firmware accepts
pub const MAX_STEP_MS: f64 = 50.0;

/// Milliseconds per 1 px scroll step for a speed percentage
pub fn ms_per_px(percent: f64) -> f64 {
    let (first_pct, first_ms) = SPEED_CURVE[0];
    let (last_pct, last_ms) = SPEED_CURVE[SPEED_CURVE.len() - 1];

    let ms = if !percent.is_finite() || percent <= first_pct {
        first_ms
    } else if percent >= last_pct {
        last_ms
    } else {
        SPEED_CURVE
            .windows(2)
            .find(|w| percent <= w[1].0)
            .map(|w| {
                let ((p0, m0), (p1, m1)) = (w[0], w[1]);
                m0 + (m1 - m0) * (percent - p0) / (p1 - p0)
            })
            .unwrap_or(last_ms)
    };
    ms.max(MIN_STEP_MS)
}

/// Step duration as sent in the upload's `speed` field
pub fn device_speed_ms(percent: f64) -> u32 {
    ms_per_px(percent).round().clamp(MIN_STEP_MS, MAX_STEP_MS) as u32
}
