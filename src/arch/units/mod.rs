mod bernoulli;
mod gaussian;
mod multinomial;
mod unit_kind;

pub use bernoulli::BernoulliUnits;
pub use gaussian::GaussianUnits;
pub use multinomial::MultinomialUnits;
pub use unit_kind::UnitKind;

pub(crate) use bernoulli::sample_bernoulli;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::{Params, activations::softplus};

/// The behaviour that changes from one kind of visible layer to another.
///
/// Hidden units are always Bernoulli, so everything the Gibbs sampler and the trainer need
/// to know about the visible layer goes through these operations.
pub trait VisibleUnits {
    /// Maps the visible pre-activation `hWᵀ + vb` to the expected value of the visible units.
    fn activation(&self, pre: Array2<f32>) -> Array2<f32>;

    /// Draws a state of the visible layer given its expected value.
    ///
    /// # Arguments
    /// * `means` - The output of `activation`.
    /// * `rng` - The model's random number generator.
    fn sample<R: Rng + ?Sized>(&self, means: ArrayView2<f32>, rng: &mut R) -> Array2<f32>;

    /// Computes the free energy of each row of `v`.
    fn free_energy(&self, params: &Params, v: ArrayView2<f32>) -> Array1<f32>;

    /// Whether the negative phase uses sampled visible states instead of their means.
    fn samples_states(&self) -> bool;
}

/// The `-Σⱼ softplus(vW + hb)ⱼ` term every variant shares.
fn hidden_free_energy(params: &Params, v: ArrayView2<f32>) -> Array1<f32> {
    -params.hidden_pre(v).mapv_into(softplus).sum_axis(Axis(1))
}
