// Synthetic tracks shared by unit tests

use std::f64::consts::PI;

use crate::samples::{ClockSample, PoseSample};

/// One counter-clockwise lap of a circle centred on the origin
///
/// `samples` points, uniformly spaced in angle, starting at `(radius, 0)`.
/// The last sample closes the loop at angle 2π. Sample `i` is stamped
/// `i * dt` seconds.
pub fn circle_track(samples: usize, radius: f64, dt: f64) -> Vec<PoseSample> {
    let steps = (samples - 1) as f64;
    (0..samples)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / steps;
            PoseSample::new(i as f64 * dt, radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Arc of the same circle covering `fraction` of a lap, never closing it
pub fn partial_arc(samples: usize, radius: f64, fraction: f64, dt: f64) -> Vec<PoseSample> {
    let steps = (samples - 1) as f64;
    (0..samples)
        .map(|i| {
            let angle = 2.0 * PI * fraction * i as f64 / steps;
            PoseSample::new(i as f64 * dt, radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Clock stream of `samples` ticks evenly spread over `[start, start + duration]`
pub fn clock_stream(samples: usize, start: f64, duration: f64) -> Vec<ClockSample> {
    let steps = (samples - 1) as f64;
    (0..samples)
        .map(|i| ClockSample::new(start + duration * i as f64 / steps))
        .collect()
}
