use ndarray::{Array1, Array2, ArrayView2, Zip};
use ndarray_rand::RandomExt;
use rand::{Rng, distr::StandardUniform};

use super::{VisibleUnits, hidden_free_energy};
use crate::arch::{Params, activations::sigmoid};

/// Binary visible units.
#[derive(Debug, Clone, Copy, Default)]
pub struct BernoulliUnits;

impl VisibleUnits for BernoulliUnits {
    fn activation(&self, pre: Array2<f32>) -> Array2<f32> {
        pre.mapv_into(sigmoid)
    }

    fn sample<R: Rng + ?Sized>(&self, means: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
        sample_bernoulli(means, rng)
    }

    fn free_energy(&self, params: &Params, v: ArrayView2<f32>) -> Array1<f32> {
        hidden_free_energy(params, v) - v.dot(&params.vb())
    }

    fn samples_states(&self) -> bool {
        false
    }
}

/// Draws independent binary states, each unit being on with its given probability.
pub(crate) fn sample_bernoulli<R: Rng + ?Sized>(probs: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
    let u = Array2::<f32>::random_using(probs.raw_dim(), StandardUniform, rng);
    Zip::from(&probs)
        .and(&u)
        .map_collect(|&p, &u| if u < p { 1. } else { 0. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn free_energy_matches_closed_form() {
        let w = array![[1., -1.], [0.5, 0.]];
        let params = Params::from_parts(w, array![0., 1.], array![0.25, -0.5]).unwrap();
        let v = array![[1., 1.]];

        // vW + hb = [1.5, 0.], v·vb = -0.25
        let expected = 0.25 - (1. + 1.5f32.exp()).ln() - 2f32.ln();
        let fe = BernoulliUnits.free_energy(&params, v.view());

        assert!((fe[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn samples_are_binary_and_respect_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let probs = array![[0., 1., 0.5], [1., 0., 0.5]];
        let s = BernoulliUnits.sample(probs.view(), &mut rng);

        assert!(s.iter().all(|&x| x == 0. || x == 1.));
        assert_eq!(s[[0, 0]], 0.);
        assert_eq!(s[[0, 1]], 1.);
        assert_eq!(s[[1, 0]], 1.);
        assert_eq!(s[[1, 1]], 0.);
    }
}
