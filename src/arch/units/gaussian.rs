use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;

use super::{VisibleUnits, hidden_free_energy};
use crate::arch::Params;

/// Real valued visible units with unit variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianUnits;

impl VisibleUnits for GaussianUnits {
    fn activation(&self, pre: Array2<f32>) -> Array2<f32> {
        pre
    }

    fn sample<R: Rng + ?Sized>(&self, means: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
        Array2::<f32>::random_using(means.raw_dim(), StandardNormal, rng) + &means
    }

    fn free_energy(&self, params: &Params, v: ArrayView2<f32>) -> Array1<f32> {
        let quadratic = (&v - &params.vb()).mapv_into(|d| 0.5 * d * d).sum_axis(Axis(1));
        quadratic + hidden_free_energy(params, v)
    }

    fn samples_states(&self) -> bool {
        true
    }
}
