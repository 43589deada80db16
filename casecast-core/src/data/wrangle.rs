//! Column-level reshaping helpers: forward fill, gap fill, running
//! differences, rolling means.

/// Carry the last present value forward over gaps. Leading gaps stay missing.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Replace remaining gaps with `fill`.
pub fn fill_missing(values: &[Option<f64>], fill: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill)).collect()
}

/// Day-over-day difference of a cumulative series.
///
/// The first entry, and any entry where either side is missing, is 0.
pub fn running_difference(values: &[Option<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let diff = match (i.checked_sub(1).and_then(|p| values[p]), values[i]) {
            (Some(prev), Some(cur)) => cur - prev,
            _ => 0.0,
        };
        out.push(diff);
    }
    out
}

/// Trailing mean over `window` entries. The first `window - 1` entries are
/// `None`; a zero window yields all `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}
