// Statistics used by the chart renderer

use std::collections::HashMap;

/// One histogram bin, `[start, end)` except for the last bin which is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Min and max of a slice, or `None` if it is empty
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Padded axis range; a degenerate range is widened by one unit each way
pub fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

const MAX_BINS: usize = 100;

/// Bin count: the larger of Sturges and Freedman-Diaconis, capped at 100
pub fn bin_count(data: &[f64]) -> usize {
    let n = data.len();
    if n < 2 {
        return 1;
    }
    let sturges = ((n as f64).log2().ceil() as usize) + 1;

    let sorted = sorted(data);
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    let range = sorted[n - 1] - sorted[0];
    let fd = if iqr > 0.0 && range > 0.0 {
        let width = 2.0 * iqr / (n as f64).cbrt();
        (range / width).ceil() as usize
    } else {
        0
    };

    sturges.max(fd).clamp(1, MAX_BINS)
}

/// Equal-width histogram over the data's range
pub fn histogram(data: &[f64]) -> Vec<Bin> {
    let Some((min, max)) = min_max(data) else {
        return Vec::new();
    };

    // Single-valued data gets one unit-wide bin centred on the value.
    let (count, start, width) = if max > min {
        let count = bin_count(data);
        (count, min, (max - min) / count as f64)
    } else {
        (1, min - 0.5, 1.0)
    };

    let mut bins: Vec<Bin> = (0..count)
        .map(|i| Bin {
            start: start + i as f64 * width,
            end: start + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for &v in data {
        let idx = (((v - start) / width).floor() as usize).min(count - 1);
        bins[idx].count += 1;
    }

    bins
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let sorted = sorted(data);
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE evaluated on `grid_points` evenly spaced points in `[lo, hi]`.
///
/// Returns `(x, density)` with the density integrating to one.
pub fn kde(data: &[f64], lo: f64, hi: f64, grid_points: usize) -> (Vec<f64>, Vec<f64>) {
    if data.is_empty() || grid_points < 2 || hi <= lo {
        return (Vec::new(), Vec::new());
    }

    let n = data.len() as f64;
    let bandwidth = silverman_bandwidth(data);
    let step = (hi - lo) / (grid_points - 1) as f64;

    let mut xs = Vec::with_capacity(grid_points);
    let mut density = Vec::with_capacity(grid_points);
    for i in 0..grid_points {
        let x = lo + i as f64 * step;
        let d: f64 = data
            .iter()
            .map(|&xi| gaussian_kernel((x - xi) / bandwidth))
            .sum();
        xs.push(x);
        density.push(d / (n * bandwidth));
    }

    (xs, density)
}

/// Pearson correlation of two equally long series.
///
/// Rows where either side is missing are dropped. `None` when fewer than two
/// complete rows remain or either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Square correlation matrix over the given columns
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
    let k = columns.len();
    let mut matrix = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i], &columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Counts of each distinct non-empty value, most frequent first.
///
/// Ties keep first-appearance order.
pub fn value_counts<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        let count = counts.entry(cell).or_insert(0);
        if *count == 0 {
            order.push(cell);
        }
        *count += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| (value.to_string(), counts[value]))
        .collect();
    // Stable sort keeps first-appearance order among equal counts.
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}
