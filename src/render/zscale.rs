//! The standard astronomical zscale display-range estimator.
//!
//! Samples the image, sorts the sample, and fits a line to the sorted
//! values with iterative k-sigma rejection.  The fitted slope, stretched
//! by the contrast, gives display limits that preserve detail around the
//! median instead of being blown out by outliers.

const MAX_SAMPLES: usize = 1000;
const CONTRAST: f64 = 0.25;
const KREJ: f64 = 2.5;
const MAX_ITERATIONS: usize = 5;
const MIN_NPIXELS: usize = 5;

/// Compute `(z1, z2)` display limits for a flat pixel sample.
///
/// Non-finite values are ignored.  Degenerate inputs (empty or constant)
/// fall back to the data range.
pub fn zscale(values: &[f32]) -> (f64, f64) {
    let mut sample: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| *v as f64)
        .collect();
    if sample.is_empty() {
        return (0.0, 1.0);
    }
    if sample.len() > MAX_SAMPLES {
        let stride = sample.len() / MAX_SAMPLES;
        sample = sample.into_iter().step_by(stride.max(1)).collect();
    }
    sample.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let npix = sample.len();
    let zmin = sample[0];
    let zmax = sample[npix - 1];
    let median = sample[npix / 2];
    if npix < MIN_NPIXELS || zmin == zmax {
        return (zmin, zmax.max(zmin + 1.0));
    }

    // Iterative least-squares fit of value against sorted index.
    let mut good: Vec<bool> = vec![true; npix];
    let mut slope = 0.0;
    let mut intercept = median;
    let min_good = MIN_NPIXELS.max(npix / 20);
    let center = (npix - 1) as f64 / 2.0;

    for _ in 0..MAX_ITERATIONS {
        let (mut sx, mut sy, mut sxx, mut sxy, mut n) = (0.0, 0.0, 0.0, 0.0, 0usize);
        for (i, v) in sample.iter().enumerate() {
            if good[i] {
                let x = i as f64 - center;
                sx += x;
                sy += v;
                sxx += x * x;
                sxy += x * v;
                n += 1;
            }
        }
        if n < min_good {
            break;
        }
        let denom = n as f64 * sxx - sx * sx;
        if denom.abs() < f64::EPSILON {
            break;
        }
        slope = (n as f64 * sxy - sx * sy) / denom;
        intercept = (sy - slope * sx) / n as f64;

        // Reject samples more than KREJ sigma off the fit.
        let mut sumsq = 0.0;
        for (i, v) in sample.iter().enumerate() {
            if good[i] {
                let r = v - (intercept + slope * (i as f64 - center));
                sumsq += r * r;
            }
        }
        let sigma = (sumsq / n as f64).sqrt();
        if sigma <= 0.0 {
            break;
        }
        let mut rejected = 0;
        for (i, v) in sample.iter().enumerate() {
            if good[i] {
                let r = (v - (intercept + slope * (i as f64 - center))).abs();
                if r > KREJ * sigma {
                    good[i] = false;
                    rejected += 1;
                }
            }
        }
        if rejected == 0 {
            break;
        }
    }

    let ngood = good.iter().filter(|g| **g).count();
    if ngood < min_good {
        return (zmin, zmax);
    }

    let stretched = slope / CONTRAST;
    let z1 = zmin.max(median - center * stretched);
    let z2 = zmax.min(median + ((npix - 1) as f64 - center) * stretched);
    (z1, z2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zscale_brackets_the_median() {
        let values: Vec<f32> = (0..500).map(|i| i as f32 / 10.0).collect();
        let (z1, z2) = zscale(&values);
        let median = 24.95;
        assert!(z1 <= median && median <= z2);
        assert!(z1 >= 0.0 && z2 <= 49.9 + 1e-6);
    }

    #[test]
    fn test_zscale_rejects_outliers() {
        // A flat field with one hot pixel: the limits should hug the
        // field, not the outlier.
        let mut values = vec![10.0f32; 400];
        values[200] = 10_000.0;
        let (z1, z2) = zscale(&values);
        assert!(z1 >= 9.0);
        assert!(z2 < 10_000.0);
    }

    #[test]
    fn test_zscale_degenerate_inputs() {
        assert_eq!(zscale(&[]), (0.0, 1.0));
        let (z1, z2) = zscale(&[5.0; 32]);
        assert_eq!(z1, 5.0);
        assert!(z2 > z1);
    }
}
