use ndarray::{Array, ArrayView, Dimension, Zip};

use super::Optimizer;
use crate::{RbmErr, Result, arch::Params};

/// Gradient ascent on the log likelihood with classical momentum and L2 weight decay.
///
/// Every step computes `vel = momentum * vel + lr * grad - decay * param` and then
/// `param += vel`, where `decay` is the L2 coefficient for the weights and zero for the
/// biases.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientAscentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    l2: f32,
    velocity: Params,
}

impl GradientAscentWithMomentum {
    /// Creates a new `GradientAscentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `velocity` - The velocity buffers, zeroed for a fresh model or restored from a checkpoint.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The fraction of the previous velocity kept on every step.
    /// * `l2` - The weight decay coefficient.
    ///
    /// # Returns
    /// A new `GradientAscentWithMomentum` instance.
    pub fn new(velocity: Params, learning_rate: f32, momentum: f32, l2: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            l2,
            velocity,
        }
    }

    /// Replaces the hyperparameters while keeping the accumulated velocity.
    pub fn set_hyperparams(&mut self, learning_rate: f32, momentum: f32, l2: f32) {
        self.learning_rate = learning_rate;
        self.momentum = momentum;
        self.l2 = l2;
    }

    pub fn velocity(&self) -> &Params {
        &self.velocity
    }
}

impl Optimizer for GradientAscentWithMomentum {
    fn update_params(&mut self, grad: &Params, params: &mut Params) -> Result<()> {
        let Self {
            learning_rate: lr,
            momentum: mu,
            l2,
            ..
        } = *self;

        let (w, hb, vb) = params.parts_mut();
        let (vel_w, vel_hb, vel_vb) = self.velocity.parts_mut();

        step(Params::W, w, vel_w, grad.w(), lr, mu, l2)?;
        step(Params::HB, hb, vel_hb, grad.hb(), lr, mu, 0.)?;
        step(Params::VB, vb, vel_vb, grad.vb(), lr, mu, 0.)?;

        Ok(())
    }
}

fn step<D: Dimension>(
    what: &'static str,
    param: &mut Array<f32, D>,
    vel: &mut Array<f32, D>,
    grad: ArrayView<f32, D>,
    lr: f32,
    mu: f32,
    decay: f32,
) -> Result<()> {
    if grad.shape() != param.shape() || vel.shape() != param.shape() {
        return Err(RbmErr::ShapeMismatch {
            what,
            got: grad.len(),
            expected: param.len(),
        });
    }

    Zip::from(param)
        .and(vel)
        .and(&grad)
        .for_each(|p, v, &g| {
            *v = mu * *v + lr * g - decay * *p;
            *p += *v;
        });

    Ok(())
}
