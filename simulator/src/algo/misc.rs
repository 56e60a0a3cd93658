//! Miscellaneous numerical helpers for raster generation.

use ndarray::Array2;

/// `n` evenly spaced samples over the closed interval `[start, end]`
///
/// A single sample yields `[start]`; zero samples yield an empty vector.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Coordinate matrices over a `(rows, cols)` raster
///
/// `x` varies along columns over `[x_min, x_max]`, `y` along rows over
/// `[y_min, y_max]`.
pub fn meshgrid(
    shape: (usize, usize),
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) -> (Array2<f64>, Array2<f64>) {
    let xs = linspace(x_min, x_max, shape.1);
    let ys = linspace(y_min, y_max, shape.0);
    let x = Array2::from_shape_fn(shape, |(_, j)| xs[j]);
    let y = Array2::from_shape_fn(shape, |(i, _)| ys[i]);
    (x, y)
}

/// Nearest raster index of `value` on an `n`-sample grid spanning `[-half, half]`
pub fn nearest_index(value: f64, half: f64, n: usize) -> Option<usize> {
    if n == 0 || !value.is_finite() || value.abs() > half {
        return None;
    }
    if n == 1 {
        return Some(0);
    }
    let position = (value + half) / (2.0 * half) * (n - 1) as f64;
    Some((position.round() as usize).min(n - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(-1.0, 1.0, 5);
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[0], -1.0);
        assert_relative_eq!(values[2], 0.0);
        assert_relative_eq!(values[4], 1.0);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
    }

    #[test]
    fn test_meshgrid_layout() {
        let (x, y) = meshgrid((2, 3), 0.0, 2.0, 10.0, 20.0);
        assert_eq!(x.dim(), (2, 3));
        assert_eq!(x[[0, 0]], 0.0);
        assert_eq!(x[[1, 2]], 2.0);
        assert_eq!(y[[0, 2]], 10.0);
        assert_eq!(y[[1, 0]], 20.0);
    }

    #[test]
    fn test_nearest_index() {
        assert_eq!(nearest_index(0.0, 1.0, 5), Some(2));
        assert_eq!(nearest_index(-1.0, 1.0, 5), Some(0));
        assert_eq!(nearest_index(1.0, 1.0, 5), Some(4));
        assert_eq!(nearest_index(0.49, 1.0, 5), Some(2));
        assert_eq!(nearest_index(0.51, 1.0, 5), Some(3));
        assert_eq!(nearest_index(1.5, 1.0, 5), None);
        assert_eq!(nearest_index(f64::NAN, 1.0, 5), None);
        assert_eq!(nearest_index(0.3, 1.0, 1), Some(0));
    }
}
