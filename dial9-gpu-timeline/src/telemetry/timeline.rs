//! Append-only log of correlated clock samples and the GPU → host time
//! conversion built on it.
//!
//! Conversion linearly interpolates between the two samples bracketing the
//! requested GPU time. The newest samples are searched first because
//! conversions almost always concern recently completed GPU work. If the
//! requested time is at or past the newest sample, one fresh sample is taken
//! so a closing bracket always exists; this is an ordinary clock read and
//! never waits on the GPU.

use crate::telemetry::clock::TimeSample;

#[derive(Debug, Default)]
pub struct Timeline {
    samples: Vec<TimeSample>,
    non_monotonic_samples: u64,
    out_of_range_lookups: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TimeSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&TimeSample> {
        self.samples.last()
    }

    /// Samples whose GPU time went backwards relative to their predecessor.
    /// Some drivers occasionally report this; lookups still work.
    pub fn non_monotonic_samples(&self) -> u64 {
        self.non_monotonic_samples
    }

    /// Lookups whose interpolation fraction fell outside `[0, 1]` and were
    /// clamped to the nearest bracketing sample.
    pub fn out_of_range_lookups(&self) -> u64 {
        self.out_of_range_lookups
    }

    pub fn push(&mut self, sample: TimeSample) {
        if let Some(prev) = self.samples.last()
            && sample.gpu_time < prev.gpu_time
        {
            self.non_monotonic_samples += 1;
            tracing::debug!(
                prev_gpu_time = prev.gpu_time,
                gpu_time = sample.gpu_time,
                "non-monotonic GPU timestamp in timeline"
            );
        }
        self.samples.push(sample);
    }

    /// Convert a GPU timestamp into host seconds.
    ///
    /// `extend` is called to take a fresh sample when `gpu_time` is at or
    /// beyond the newest sample (exactly once), and to seed an empty timeline.
    pub fn host_time_for(&mut self, gpu_time: i64, mut extend: impl FnMut() -> TimeSample) -> f64 {
        if self.samples.is_empty() {
            self.push(extend());
        }

        let last = self.samples.len() - 1;
        let mut first = last;
        while first > 0 {
            if self.samples[first].gpu_time < gpu_time {
                break;
            }
            first -= 1;
        }

        if first == last || gpu_time >= self.samples[last].gpu_time {
            self.push(extend());
        }

        let start = self.samples[first];
        let end = self.samples[first + 1];
        self.interpolate(&start, &end, gpu_time)
    }

    fn interpolate(&mut self, start: &TimeSample, end: &TimeSample, gpu_time: i64) -> f64 {
        let gpu_range = end.gpu_time as i128 - start.gpu_time as i128;
        if gpu_range == 0 {
            return start.host_time;
        }
        if gpu_time == end.gpu_time {
            return end.host_time;
        }

        let gpu_delta = gpu_time as i128 - start.gpu_time as i128;
        let mut t = gpu_delta as f64 / gpu_range as f64;
        if !(0.0..=1.0).contains(&t) {
            self.out_of_range_lookups += 1;
            t = t.clamp(0.0, 1.0);
        }
        start.host_time + t * (end.host_time - start.host_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(gpu_time: i64, host_time: f64) -> TimeSample {
        TimeSample {
            gpu_time,
            host_time,
        }
    }

    fn timeline(samples: &[(i64, f64)]) -> Timeline {
        let mut tl = Timeline::new();
        for &(g, h) in samples {
            tl.push(sample(g, h));
        }
        tl
    }

    fn no_extend() -> TimeSample {
        panic!("lookup should not need a fresh sample")
    }

    #[test]
    fn test_midpoint_lerp() {
        let mut tl = timeline(&[(1000, 0.0), (2000, 1.0)]);
        assert_eq!(tl.host_time_for(1500, no_extend), 0.5);
        assert_eq!(tl.len(), 2);
    }

    #[test]
    fn test_exact_at_sample_points() {
        let mut tl = timeline(&[(100, 0.1), (250, 0.37), (900, 1.3), (1000, 2.0)]);
        assert_eq!(tl.host_time_for(100, no_extend), 0.1);
        assert_eq!(tl.host_time_for(250, no_extend), 0.37);
        assert_eq!(tl.host_time_for(900, no_extend), 1.3);
    }

    #[test]
    fn test_degenerate_bracket_returns_start() {
        let mut tl = timeline(&[(500, 3.0), (500, 4.0), (800, 5.0)]);
        let h = tl.host_time_for(500, no_extend);
        assert_eq!(h, 3.0);
        assert!(h.is_finite());
    }

    #[test]
    fn test_extends_past_last_sample() {
        let mut tl = timeline(&[(1000, 0.0), (2000, 1.0)]);
        let mut calls = 0;
        let h = tl.host_time_for(2500, || {
            calls += 1;
            sample(3000, 2.0)
        });
        assert_eq!(calls, 1);
        assert_eq!(tl.len(), 3);
        assert_eq!(h, 1.5);
    }

    #[test]
    fn test_extends_at_last_sample() {
        let mut tl = timeline(&[(1000, 0.0), (2000, 1.0)]);
        let mut calls = 0;
        let h = tl.host_time_for(2000, || {
            calls += 1;
            sample(3000, 2.0)
        });
        assert_eq!(calls, 1);
        assert_eq!(h, 1.0);
    }

    #[test]
    fn test_single_sample_extends() {
        let mut tl = timeline(&[(1000, 1.0)]);
        let h = tl.host_time_for(1200, || sample(2000, 2.0));
        assert_eq!(tl.len(), 2);
        assert!((h - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_empty_timeline_is_seeded() {
        let mut tl = Timeline::new();
        let mut next = [sample(1000, 1.0), sample(3000, 3.0)].into_iter();
        let h = tl.host_time_for(2000, || next.next().unwrap());
        assert_eq!(tl.len(), 2);
        assert_eq!(h, 2.0);
    }

    #[test]
    fn test_before_first_sample_is_clamped() {
        let mut tl = timeline(&[(1000, 1.0), (2000, 2.0)]);
        assert_eq!(tl.host_time_for(500, no_extend), 1.0);
        assert_eq!(tl.out_of_range_lookups(), 1);
    }

    #[test]
    fn test_non_monotonic_samples_are_counted_and_tolerated() {
        let mut tl = timeline(&[(100, 0.0), (300, 1.0), (200, 2.0), (400, 3.0)]);
        assert_eq!(tl.non_monotonic_samples(), 1);
        let h = tl.host_time_for(350, no_extend);
        assert!(h.is_finite());
        assert!(h > 2.0 && h < 3.0);
    }

    fn arb_timeline() -> impl Strategy<Value = Vec<(i64, f64)>> {
        prop::collection::vec((2i64..1_000_000, 0.01f64..10.0), 2..16).prop_map(|steps| {
            let mut g = 0i64;
            let mut h = 0.0f64;
            steps
                .into_iter()
                .map(|(dg, dh)| {
                    g += dg;
                    h += dh;
                    (g, h)
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn lookup_lands_strictly_inside_bracket(
            samples in arb_timeline(),
            pick in any::<prop::sample::Index>(),
            frac in 0.001f64..0.999,
        ) {
            let i = pick.index(samples.len() - 1);
            let (g0, h0) = samples[i];
            let (g1, h1) = samples[i + 1];
            let target = g0 + ((g1 - g0) as f64 * frac) as i64;
            prop_assume!(target > g0 && target < g1);

            let mut tl = timeline(&samples);
            let h = tl.host_time_for(target, no_extend);
            prop_assert!(h > h0 && h < h1, "{h} not in ({h0}, {h1})");

            let expected = h0 + (target - g0) as f64 / (g1 - g0) as f64 * (h1 - h0);
            prop_assert!((h - expected).abs() < 1e-9);
        }

        #[test]
        fn lookup_is_exact_at_samples(samples in arb_timeline(), pick in any::<prop::sample::Index>()) {
            let i = pick.index(samples.len() - 1);
            let mut tl = timeline(&samples);
            prop_assert_eq!(tl.host_time_for(samples[i].0, no_extend), samples[i].1);
        }
    }
}
