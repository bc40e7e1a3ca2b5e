//! Pick one canvas resolution for a heterogeneous set of source images.
//!
//! Each axis is solved on its own as a weighted-frequency problem (weights are frame
//! counts), then a correction pass checks whether the value actually paired with the
//! other axis' pick would be larger. The result is a tie-break heuristic, not an average.

use std::collections::BTreeMap;

use crate::{foundation::core::Resolution, scan::descriptor::FrameDescriptor};

pub const DEFAULT_RESOLUTION: Resolution = Resolution::HD_720;

/// Number of frames per distinct source resolution.
pub type ResolutionTally = BTreeMap<Resolution, u64>;

/// Count resolutions over `frames`; banners and undecodable files are ignored.
pub fn tally<'a>(frames: impl IntoIterator<Item = &'a FrameDescriptor>) -> ResolutionTally {
    let mut out = ResolutionTally::new();
    for r in frames.into_iter().filter_map(FrameDescriptor::resolution) {
        *out.entry(r).or_insert(0) += 1;
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Width,
    Height,
}

impl Axis {
    fn of(self, r: Resolution) -> u32 {
        match self {
            Axis::Width => r.width(),
            Axis::Height => r.height(),
        }
    }

    fn other(self) -> Self {
        match self {
            Axis::Width => Axis::Height,
            Axis::Height => Axis::Width,
        }
    }
}

/// Choose the canvas resolution for `tally`; an empty tally yields 1280x720.
pub fn choose(tally: &ResolutionTally) -> Resolution {
    let (Some(w), Some(h)) = (
        pick_axis(tally.iter().map(|(r, n)| (r.width(), *n))),
        pick_axis(tally.iter().map(|(r, n)| (r.height(), *n))),
    ) else {
        return DEFAULT_RESOLUTION;
    };
    let provisional = (w, h);

    let alt_w = corrected(tally, Axis::Width, provisional).map(|v| (v, h));
    let alt_h = corrected(tally, Axis::Height, provisional).map(|v| (w, v));

    let (cw, ch) = match (alt_w, alt_h) {
        (Some(a), None) | (None, Some(a)) => a,
        (Some(a), Some(b)) => {
            if area(b) > area(a) {
                b
            } else {
                a
            }
        }
        (None, None) => provisional,
    };
    let chosen = Resolution::new(cw, ch).unwrap_or(DEFAULT_RESOLUTION);
    tracing::debug!(
        provisional = %format!("{w}x{h}"),
        %chosen,
        distinct = tally.len(),
        "resolution consensus"
    );
    chosen
}

fn area((w, h): (u32, u32)) -> u64 {
    u64::from(w) * u64::from(h)
}

/// Re-run the axis pick over entries whose other axis equals the provisional pick; a
/// strictly larger result is an alternative for `axis`.
fn corrected(tally: &ResolutionTally, axis: Axis, provisional: (u32, u32)) -> Option<u32> {
    let (current, other_value) = match axis {
        Axis::Width => provisional,
        Axis::Height => (provisional.1, provisional.0),
    };
    let restricted = tally
        .iter()
        .filter(|(r, _)| axis.other().of(**r) == other_value)
        .map(|(r, n)| (axis.of(*r), *n));
    pick_axis(restricted).filter(|v| *v > current)
}

/// Weighted pick for one axis: drop values below the weighted mean, merge duplicates,
/// take the heaviest value (the larger one on ties) and round it down to even.
///
/// Returns `None` for no input, or when rounding would leave zero.
fn pick_axis(values: impl Iterator<Item = (u32, u64)>) -> Option<u32> {
    let mut merged = BTreeMap::<u32, u64>::new();
    for (v, n) in values {
        if n > 0 {
            *merged.entry(v).or_insert(0) += n;
        }
    }
    let total: u64 = merged.values().sum();
    if total == 0 {
        return None;
    }
    let weighted: f64 = merged
        .iter()
        .map(|(v, n)| f64::from(*v) * (*n as f64))
        .sum();
    let mean = weighted / (total as f64);

    let (best, _) = merged
        .iter()
        .filter(|(v, _)| f64::from(**v) >= mean)
        .max_by(|(va, na), (vb, nb)| na.cmp(nb).then(va.cmp(vb)))?;
    let even = best / 2 * 2;
    (even > 0).then_some(even)
}
