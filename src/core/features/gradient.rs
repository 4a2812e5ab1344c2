//! Shared filtering primitives: padding, 2-D correlation, Sobel gradients
//! and window sums.

use ndarray::{s, Array2, ArrayView2};

/// Horizontal Sobel kernel
pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Vertical Sobel kernel
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// How samples outside the image are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// Everything outside the image is zero
    Zero,
    /// The nearest edge sample is repeated
    Replicate,
}

/// Pad `samples` by `(before, after)` rows and `(before, after)` columns.
pub fn pad(
    samples: &Array2<f64>,
    rows: (usize, usize),
    cols: (usize, usize),
    border: Border,
) -> Array2<f64> {
    let (height, width) = samples.dim();
    let shape = (height + rows.0 + rows.1, width + cols.0 + cols.1);

    if height == 0 || width == 0 {
        return Array2::zeros(shape);
    }

    match border {
        Border::Zero => {
            let mut padded = Array2::zeros(shape);
            padded
                .slice_mut(s![rows.0..rows.0 + height, cols.0..cols.0 + width])
                .assign(samples);
            padded
        }
        Border::Replicate => Array2::from_shape_fn(shape, |(y, x)| {
            let sy = y.saturating_sub(rows.0).min(height - 1);
            let sx = x.saturating_sub(cols.0).min(width - 1);
            samples[[sy, sx]]
        }),
    }
}

/// Correlate `samples` with `kernel`, keeping the input shape.
///
/// The kernel anchor sits at `((kh - 1) / 2, (kw - 1) / 2)`.
pub fn correlate(samples: &Array2<f64>, kernel: ArrayView2<'_, f64>, border: Border) -> Array2<f64> {
    let (height, width) = samples.dim();
    let (kernel_height, kernel_width) = kernel.dim();
    let rows = ((kernel_height - 1) / 2, kernel_height - 1 - (kernel_height - 1) / 2);
    let cols = ((kernel_width - 1) / 2, kernel_width - 1 - (kernel_width - 1) / 2);
    let padded = pad(samples, rows, cols, border);

    let mut output = Array2::zeros((height, width));
    for ((dy, dx), &weight) in kernel.indexed_iter() {
        if weight == 0.0 {
            continue;
        }
        output.scaled_add(weight, &padded.slice(s![dy..dy + height, dx..dx + width]));
    }
    output
}

/// Horizontal and vertical Sobel responses with replicated borders.
///
/// A flat image therefore has zero gradient everywhere, edges included.
pub fn sobel_gradients(samples: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let kernel_x = Array2::from_shape_fn((3, 3), |(y, x)| SOBEL_X[y][x]);
    let kernel_y = Array2::from_shape_fn((3, 3), |(y, x)| SOBEL_Y[y][x]);
    (
        correlate(samples, kernel_x.view(), Border::Replicate),
        correlate(samples, kernel_y.view(), Border::Replicate),
    )
}

/// Sum over a `window x window` neighbourhood with zero padding.
pub fn window_sum(samples: &Array2<f64>, window: usize) -> Array2<f64> {
    let kernel = Array2::ones((window, window));
    correlate(samples, kernel.view(), Border::Zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zero_padding_surrounds_samples() {
        let samples = array![[1.0, 2.0], [3.0, 4.0]];
        let padded = pad(&samples, (1, 1), (1, 1), Border::Zero);

        assert_eq!(padded.dim(), (4, 4));
        assert_eq!(padded[[0, 0]], 0.0);
        assert_eq!(padded[[1, 1]], 1.0);
        assert_eq!(padded[[2, 2]], 4.0);
    }

    #[test]
    fn replicate_padding_repeats_edges() {
        let samples = array![[1.0, 2.0], [3.0, 4.0]];
        let padded = pad(&samples, (1, 1), (1, 1), Border::Replicate);

        assert_eq!(padded[[0, 0]], 1.0);
        assert_eq!(padded[[0, 3]], 2.0);
        assert_eq!(padded[[3, 0]], 3.0);
        assert_eq!(padded[[3, 3]], 4.0);
    }

    #[test]
    fn sobel_of_flat_image_is_zero() {
        let samples = Array2::from_elem((6, 5), 128.0);
        let (gx, gy) = sobel_gradients(&samples);

        assert!(gx.iter().all(|&v| v == 0.0));
        assert!(gy.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sobel_detects_horizontal_ramp() {
        // Intensity grows by 1 per column
        let samples = Array2::from_shape_fn((5, 5), |(_, x)| x as f64);
        let (gx, gy) = sobel_gradients(&samples);

        // Interior: (1 + 2 + 1) * (x+1 - (x-1)) = 8
        assert_eq!(gx[[2, 2]], 8.0);
        assert_eq!(gy[[2, 2]], 0.0);
    }

    #[test]
    fn window_sum_uses_zero_border() {
        let samples = Array2::ones((4, 4));
        let summed = window_sum(&samples, 3);

        assert_eq!(summed[[0, 0]], 4.0);
        assert_eq!(summed[[0, 1]], 6.0);
        assert_eq!(summed[[1, 1]], 9.0);
    }
}
