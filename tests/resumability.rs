mod common;

use std::num::NonZeroUsize;

use boltzmann::{Param, Params, Rbm};
use common::{UNITS, assert_allclose, build, config, init_logger, train_data, val_data};

fn assert_same_weights(a: &Params, b: &Params) {
    assert_allclose(a.w(), b.w());
    assert_allclose(a.hb(), b.hb());
    assert_allclose(a.vb(), b.vb());
}

fn check_fit_consistency(with_val: bool) {
    init_logger();
    let x = train_data();
    let x_val = val_data();
    let val = with_val.then(|| x_val.view());

    for units in UNITS {
        let dirs: Vec<_> = (0..3).map(|_| tempfile::tempdir().unwrap()).collect();
        let cfg = |max_epoch, dir: usize| boltzmann::RbmConfig {
            model_path: Some(dirs[dir].path().to_path_buf()),
            ..config(max_epoch)
        };

        // train 2, then 5 more epochs in memory
        let mut rbm = build(units, cfg(2, 0)).unwrap();
        rbm.fit(x.view(), val).unwrap();
        let in_memory = rbm
            .set_params([Param::MaxEpoch(7)])
            .unwrap()
            .fit(x.view(), val)
            .unwrap()
            .get_weights();

        // train 2, save, load and train 5 more epochs
        build(units, cfg(2, 1))
            .unwrap()
            .fit(x.view(), val)
            .unwrap();
        let mut loaded = Rbm::load_model(dirs[1].path()).unwrap();
        assert_eq!(loaded.epochs_trained(), 2);
        assert_eq!(loaded.units(), units);

        let resumed = loaded
            .set_params([Param::MaxEpoch(7)])
            .unwrap()
            .fit(x.view(), val)
            .unwrap()
            .get_weights();
        assert_same_weights(&in_memory, &resumed);

        // train 7 epochs in one go
        let mut rbm = build(units, cfg(7, 2)).unwrap();
        let continuous = rbm.fit(x.view(), val).unwrap().get_weights();
        assert_same_weights(&resumed, &continuous);
        assert_eq!(rbm.epochs_trained(), 7);
    }
}

#[test]
fn fit_consistency() {
    check_fit_consistency(false);
}

#[test]
fn fit_consistency_with_validation_data() {
    check_fit_consistency(true);
}

#[test]
fn resuming_with_momentum_and_longer_chains() {
    init_logger();
    let x = train_data();

    for units in UNITS {
        let dir = tempfile::tempdir().unwrap();
        let cfg = |max_epoch| boltzmann::RbmConfig {
            momentum: 0.9,
            l2: 1e-3,
            n_gibbs_steps: NonZeroUsize::new(3).unwrap(),
            batch_size: NonZeroUsize::new(7).unwrap(),
            ..config(max_epoch)
        };

        let continuous = build(units, cfg(4))
            .unwrap()
            .fit(x.view(), None)
            .unwrap()
            .get_weights();

        let mut rbm = build(units, cfg(1)).unwrap();
        rbm.fit(x.view(), None).unwrap().save(dir.path()).unwrap();

        let resumed = Rbm::load_model(dir.path())
            .unwrap()
            .set_params([Param::MaxEpoch(4)])
            .unwrap()
            .fit(x.view(), None)
            .unwrap()
            .get_weights();

        assert_same_weights(&continuous, &resumed);
    }
}

#[test]
fn transform_matches_after_reload() {
    init_logger();
    let x = train_data();
    let x_val = val_data();

    for units in UNITS {
        let dir = tempfile::tempdir().unwrap();
        let mut rbm = build(
            units,
            boltzmann::RbmConfig {
                model_path: Some(dir.path().to_path_buf()),
                ..config(2)
            },
        )
        .unwrap();

        rbm.fit(x.view(), None).unwrap();
        let h = rbm.transform(x_val.view()).unwrap();
        let h_loaded = Rbm::load_model(dir.path())
            .unwrap()
            .transform(x_val.view())
            .unwrap();

        assert_eq!(h.dim(), (16, 16));
        assert!(h.iter().all(|p| (0. ..=1.).contains(p)));
        assert_allclose(h.view(), h_loaded.view());
    }
}
