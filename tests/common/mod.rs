#![allow(dead_code)]

use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView, Dimension};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, distr::StandardUniform};
use rand_chacha::ChaCha8Rng;

use boltzmann::{Rbm, RbmConfig, Result, UnitKind};

pub const UNITS: [UnitKind; 3] = [UnitKind::Bernoulli, UnitKind::Multinomial, UnitKind::Gaussian];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Uniform samples in `[0, 1)`, reproducible from `seed`.
pub fn uniform(rows: usize, cols: usize, seed: u64) -> Array2<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::random_using((rows, cols), StandardUniform, &mut rng)
}

pub fn train_data() -> Array2<f32> {
    uniform(32, 24, 1337)
}

pub fn val_data() -> Array2<f32> {
    uniform(16, 24, 42)
}

pub fn config(max_epoch: usize) -> RbmConfig {
    RbmConfig {
        max_epoch,
        random_seed: 1337,
        l2: 0.,
        compute_dfe_every_epoch: NonZeroUsize::new(10_000).unwrap(),
        verbose: false,
        ..RbmConfig::new(24, 16)
    }
}

pub fn build(units: UnitKind, config: RbmConfig) -> Result<Rbm> {
    Rbm::new(units, config)
}

pub fn assert_allclose<D: Dimension>(actual: ArrayView<f32, D>, expected: ArrayView<f32, D>) {
    const RTOL: f32 = 1e-7;

    assert_eq!(actual.shape(), expected.shape());
    for (a, e) in actual.iter().zip(&expected) {
        assert!(
            (a - e).abs() <= RTOL * e.abs(),
            "not close: actual {a}, expected {e}"
        );
    }
}
