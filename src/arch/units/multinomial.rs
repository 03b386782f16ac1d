use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;

use super::{VisibleUnits, hidden_free_energy};
use crate::arch::{
    Params,
    activations::{log_sum_exp, softmax_rows},
};

/// A visible layer made of a single softmax group: each row encodes one of `n_visible`
/// categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultinomialUnits;

impl VisibleUnits for MultinomialUnits {
    fn activation(&self, pre: Array2<f32>) -> Array2<f32> {
        softmax_rows(pre)
    }

    fn sample<R: Rng + ?Sized>(&self, means: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
        let mut one_hot = Array2::zeros(means.raw_dim());

        for (probs, mut out) in means.rows().into_iter().zip(one_hot.rows_mut()) {
            let u: f32 = rng.random();
            let mut acc = 0.;
            // rounding can leave the cumulative sum short of 1
            let mut pick = probs.len() - 1;

            for (i, &p) in probs.iter().enumerate() {
                acc += p;
                if u < acc {
                    pick = i;
                    break;
                }
            }

            out[pick] = 1.;
        }

        one_hot
    }

    fn free_energy(&self, params: &Params, v: ArrayView2<f32>) -> Array1<f32> {
        let vb = params.vb();
        let lse = log_sum_exp(vb);
        let log_probs = vb.mapv(|b| b - lse);
        hidden_free_energy(params, v) - v.dot(&log_probs)
    }

    fn samples_states(&self) -> bool {
        true
    }
}
