//! Linear, band and time scales.
//!
//! Scales are rebuilt from the whole snapshot on every cycle; none of them carries
//! state between cycles.

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Continuous numeric scale `domain -> range`. The range may be inverted
/// (`[height, 0]`) so larger values sit higher on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f32; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f32; 2]) -> Self {
        Self { domain, range }
    }

    /// `[0, max(values)]` domain. An empty input yields `[0, 0]`.
    pub fn zero_to_max(values: impl IntoIterator<Item = f64>, range: [f32; 2]) -> Self {
        let max = values.into_iter().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.max(v)))
        });
        Self::new([0.0, max.unwrap_or(0.0)], range)
    }

    /// Map a domain value into the range. A zero-span domain maps to the range start.
    pub fn map(&self, v: f64) -> f32 {
        let span = self.domain[1] - self.domain[0];
        if span == 0.0 || !span.is_finite() {
            return self.range[0];
        }
        let t = ((v - self.domain[0]) / span) as f32;
        self.range[0] + (self.range[1] - self.range[0]) * t
    }

    /// Human-friendly tick values covering the domain (steps of 1, 2 or 5 x 10^k).
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = (
            self.domain[0].min(self.domain[1]),
            self.domain[0].max(self.domain[1]),
        );
        if count == 0 || !(hi - lo).is_finite() {
            return Vec::new();
        }
        if hi == lo {
            return vec![lo];
        }
        let step = tick_step(lo, hi, count);
        let start = (lo / step - 1e-9).ceil() as i64;
        let stop = (hi / step + 1e-9).floor() as i64;
        (start..=stop).map(|i| i as f64 * step).collect()
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Categorical scale assigning each name an equal-width band.
#[derive(Clone, Debug, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    range: [f32; 2],
    padding_inner: f32,
    padding_outer: f32,
    step: f32,
    bandwidth: f32,
    start: f32,
}

impl BandScale {
    /// Build from names in input order; repeated names keep their first position.
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        range: [f32; 2],
        padding_inner: f32,
        padding_outer: f32,
    ) -> Self {
        let mut domain: Vec<String> = Vec::new();
        for n in names {
            let n = n.into();
            if !domain.contains(&n) {
                domain.push(n);
            }
        }
        let padding_inner = padding_inner.clamp(0.0, 1.0);
        let padding_outer = padding_outer.max(0.0);
        let n = domain.len() as f32;
        let width = range[1] - range[0];
        let denom = (n - padding_inner + 2.0 * padding_outer).max(1.0);
        let step = width / denom;
        let bandwidth = step * (1.0 - padding_inner);
        let start = range[0] + step * padding_outer;
        Self {
            domain,
            range,
            padding_inner,
            padding_outer,
            step,
            bandwidth,
            start,
        }
    }

    /// Left edge of the band for `name`, or `None` if not in the domain.
    pub fn position(&self, name: &str) -> Option<f32> {
        self.domain
            .iter()
            .position(|d| d == name)
            .map(|i| self.start + self.step * i as f32)
    }

    #[inline]
    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn range(&self) -> [f32; 2] {
        self.range
    }

    /// `(inner, outer)` padding fractions.
    pub fn padding(&self) -> (f32, f32) {
        (self.padding_inner, self.padding_outer)
    }
}

/// Continuous scale over timestamps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeScale {
    pub domain: [DateTime<Utc>; 2],
    pub range: [f32; 2],
}

impl TimeScale {
    /// Extent of `dates`; `None` when there are none.
    pub fn extent(
        dates: impl IntoIterator<Item = DateTime<Utc>>,
        range: [f32; 2],
    ) -> Option<Self> {
        let mut it = dates.into_iter();
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self {
            domain: [lo, hi],
            range,
        })
    }

    /// Map a timestamp into the range. A single-instant extent maps to the range midpoint.
    pub fn map(&self, d: DateTime<Utc>) -> f32 {
        let span = (self.domain[1] - self.domain[0]).num_milliseconds();
        if span == 0 {
            return (self.range[0] + self.range[1]) / 2.0;
        }
        let t = (d - self.domain[0]).num_milliseconds() as f64 / span as f64;
        self.range[0] + (self.range[1] - self.range[0]) * t as f32
    }

    /// Midnight-aligned ticks with a whole-day step chosen so at most `count` fit.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        if count == 0 {
            return Vec::new();
        }
        let span_days = (self.domain[1] - self.domain[0]).num_days().max(0) + 1;
        let step_days = ((span_days as f64 / count as f64).ceil() as i64).max(1);
        let step = Duration::days(step_days);
        let day = Duration::days(1);
        let Ok(mut t) = self.domain[0].duration_trunc(day) else {
            return Vec::new();
        };
        if t < self.domain[0] {
            t += day;
        }
        let mut out = Vec::new();
        while t <= self.domain[1] && out.len() <= count {
            out.push(t);
            t += step;
        }
        out
    }
}
