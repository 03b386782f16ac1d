//! Scalar and row-wise nonlinearities shared by every unit variant.

use ndarray::{Array2, ArrayView1};

/// The logistic function.
pub fn sigmoid(z: f32) -> f32 {
    1. / (1. + (-z).exp())
}

/// `ln(1 + e^z)` without overflowing for large `z`.
pub fn softplus(z: f32) -> f32 {
    z.max(0.) + (-z.abs()).exp().ln_1p()
}

/// `ln(sum(e^x))` shifted by the maximum so it doesn't overflow.
pub fn log_sum_exp(x: ArrayView1<f32>) -> f32 {
    let max = x.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    if !max.is_finite() {
        return max;
    }

    max + x.mapv(|v| (v - max).exp()).sum().ln()
}

/// Applies the softmax function to each row of `a` in place.
///
/// # Arguments
/// * `a` - A batch of pre-activations, one softmax group per row.
///
/// # Returns
/// The same buffer, where every row is now a probability vector.
pub fn softmax_rows(mut a: Array2<f32>) -> Array2<f32> {
    for mut row in a.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row /= total;
    }

    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    #[test]
    fn sigmoid_is_bounded() {
        assert_eq!(sigmoid(0.), 0.5);
        assert_eq!(sigmoid(f32::NEG_INFINITY), 0.);
        assert_eq!(sigmoid(f32::INFINITY), 1.);
    }

    #[test]
    fn softplus_matches_naive_formula() {
        for z in [-5., -0.5, 0., 0.5, 5.] {
            let naive = (1. + f32::exp(z)).ln();
            assert!((softplus(z) - naive).abs() < 1e-6, "z = {z}");
        }

        assert_eq!(softplus(1000.), 1000.);
    }

    #[test]
    fn log_sum_exp_of_equal_values() {
        let x = array![2., 2.];
        assert!((log_sum_exp(x.view()) - (2. + 2f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn softmax_rows_are_distributions() {
        let a = array![[1., 2., 3.], [1000., 0., -1000.]];
        let p = softmax_rows(a);

        for total in p.sum_axis(Axis(1)) {
            assert!((total - 1.).abs() < 1e-6);
        }
        assert!(p[[0, 2]] > p[[0, 1]] && p[[0, 1]] > p[[0, 0]]);
        assert_eq!(p[[1, 0]], 1.);
    }
}
