use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{BernoulliUnits, GaussianUnits, MultinomialUnits, VisibleUnits};
use crate::arch::Params;

/// The distribution of a model's visible layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Bernoulli,
    Multinomial,
    Gaussian,
}

use UnitKind::*;

impl UnitKind {
    /// The name this variant is persisted under.
    pub fn name(&self) -> &'static str {
        match self {
            Bernoulli => "bernoulli",
            Multinomial => "multinomial",
            Gaussian => "gaussian",
        }
    }
}

impl VisibleUnits for UnitKind {
    fn activation(&self, pre: Array2<f32>) -> Array2<f32> {
        match self {
            Bernoulli => BernoulliUnits.activation(pre),
            Multinomial => MultinomialUnits.activation(pre),
            Gaussian => GaussianUnits.activation(pre),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, means: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
        match self {
            Bernoulli => BernoulliUnits.sample(means, rng),
            Multinomial => MultinomialUnits.sample(means, rng),
            Gaussian => GaussianUnits.sample(means, rng),
        }
    }

    fn free_energy(&self, params: &Params, v: ArrayView2<f32>) -> Array1<f32> {
        match self {
            Bernoulli => BernoulliUnits.free_energy(params, v),
            Multinomial => MultinomialUnits.free_energy(params, v),
            Gaussian => GaussianUnits.free_energy(params, v),
        }
    }

    fn samples_states(&self) -> bool {
        match self {
            Bernoulli => BernoulliUnits.samples_states(),
            Multinomial => MultinomialUnits.samples_states(),
            Gaussian => GaussianUnits.samples_states(),
        }
    }
}
