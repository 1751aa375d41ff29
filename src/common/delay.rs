// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use rand::Rng;
use rand::distributions::uniform::SampleUniform;
use serde::Deserialize;
use std::time::Duration;

/// Inclusive `[min, max]` pair as written in configuration. A reversed pair
/// is normalized on load.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(
    from = "[T; 2]",
    bound(deserialize = "T: Deserialize<'de> + PartialOrd + Copy")
)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> From<[T; 2]> for Span<T> {
    fn from([a, b]: [T; 2]) -> Self {
        if a <= b {
            Span { min: a, max: b }
        } else {
            Span { min: b, max: a }
        }
    }
}

impl<T: SampleUniform + PartialOrd + Copy> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Span { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Span<u64> {
    pub fn is_zero(&self) -> bool {
        self.max == 0
    }
}

impl Span<f64> {
    /// Sample and round to `decimals` places, the way amounts are quoted.
    pub fn sample_rounded<R: Rng + ?Sized>(&self, rng: &mut R, decimals: i32) -> f64 {
        let scale = 10f64.powi(decimals);
        (self.sample(rng) * scale).round() / scale
    }
}

/// Sleep for a random number of seconds drawn from `span`.
pub async fn sleep_range(span: Span<u64>) {
    let secs = {
        let mut rng = rand::thread_rng();
        span.sample(&mut rng)
    };
    if secs == 0 {
        return;
    }
    tracing::debug!(target: "delay", secs, "Sleeping");
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn reversed_pair_is_normalized() {
        let span: Span<u64> = serde_json::from_str("[15, 10]").unwrap();
        assert_eq!(span, Span::new(10, 15));
    }

    #[test]
    fn samples_stay_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let span = Span::new(20u32, 30u32);
        for _ in 0..200 {
            let v = span.sample(&mut rng);
            assert!((20..=30).contains(&v));
        }
        assert_eq!(Span::new(4u32, 4u32).sample(&mut rng), 4);
        let amount = Span::new(0.003, 0.004).sample_rounded(&mut rng, 6);
        assert!((0.003..=0.004).contains(&amount));
    }

    #[tokio::test]
    async fn zero_span_returns_immediately() {
        let started = std::time::Instant::now();
        sleep_range(Span::new(0, 0)).await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
