use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use log::debug;
use ndarray::{Array1, Array2};
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use super::header::{FORMAT_VERSION, HEADER_KEY, Header};
use crate::{
    RbmConfig, RbmErr, Result,
    arch::{Params, UnitKind},
    optimization::GradientAscentWithMomentum,
    training::TrainState,
};

/// The name of the checkpoint file inside a model directory.
pub const CHECKPOINT_FILE: &str = "checkpoint.safetensors";

const TMP_FILE: &str = ".checkpoint.safetensors.tmp";
const VELOCITY_SUFFIX: &str = ".velocity";

/// Everything needed to rebuild a model exactly as it was saved.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub units: UnitKind,
    pub config: RbmConfig,
    pub state: TrainState,
}

/// Writes a checkpoint to `dir`, replacing the previous one.
///
/// The bytes are first written and synced to a temporary file in the same directory,
/// which is then renamed over the checkpoint. A reader sees either the old or the new
/// checkpoint, never a mix of both.
///
/// # Arguments
/// * `dir` - The model directory, created if missing.
/// * `units` - The model's visible units.
/// * `config` - The model's configuration.
/// * `state` - The training state to persist.
///
/// # Returns
/// A `CorruptState` error, leaving the previous checkpoint untouched, if any parameter
/// holds non finite values.
pub fn save(dir: &Path, units: UnitKind, config: &RbmConfig, state: &TrainState) -> Result<()> {
    if let Some(param) = state.params.first_non_finite() {
        return Err(RbmErr::corrupt(
            dir.join(CHECKPOINT_FILE),
            format!("refusing to save non finite `{param}`"),
        ));
    }

    fs::create_dir_all(dir)?;

    let header = Header {
        format_version: FORMAT_VERSION,
        units,
        config: config.clone(),
        epochs_trained: state.epochs_trained,
        rng: state.rng.clone(),
    };
    let header = serde_json::to_string(&header).map_err(io::Error::other)?;
    let metadata = Some(HashMap::from([(HEADER_KEY.to_string(), header)]));

    let velocity = state.optimizer.velocity();
    let buffers: Vec<_> = state
        .params
        .iter()
        .map(|(name, p)| (name.to_string(), p))
        .chain(
            velocity
                .iter()
                .map(|(name, p)| (format!("{name}{VELOCITY_SUFFIX}"), p)),
        )
        .map(|(name, p)| {
            let bytes: Vec<u8> = p.iter().flat_map(|x| x.to_le_bytes()).collect();
            (name, p.shape().to_vec(), bytes)
        })
        .collect();

    let tensors = buffers
        .iter()
        .map(|(name, shape, bytes)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes).map(|view| (name.as_str(), view))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(io::Error::other)?;

    let bytes = safetensors::serialize(tensors, &metadata).map_err(io::Error::other)?;

    let tmp = dir.join(TMP_FILE);
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, dir.join(CHECKPOINT_FILE))?;

    debug!(
        "saved checkpoint at epoch {} to {}",
        state.epochs_trained,
        dir.display()
    );
    Ok(())
}

/// Reads the checkpoint stored in `dir`.
///
/// The configuration of the returned checkpoint points its `model_path` at `dir`.
///
/// # Returns
/// A `NotFound` error if `dir` holds no checkpoint or isn't a directory, or a
/// `CorruptState` error if it can't be turned back into a consistent training state.
pub fn load(dir: &Path) -> Result<Checkpoint> {
    let path = dir.join(CHECKPOINT_FILE);
    let corrupt = |reason: String| RbmErr::corrupt(&path, reason);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if matches!(
            e.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
        ) =>
        {
            return Err(RbmErr::NotFound {
                path: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let (_, metadata) = SafeTensors::read_metadata(&bytes).map_err(|e| corrupt(e.to_string()))?;
    let header = metadata
        .metadata()
        .as_ref()
        .and_then(|m| m.get(HEADER_KEY))
        .ok_or_else(|| corrupt("missing header".to_string()))?;

    let Header {
        format_version,
        units,
        mut config,
        epochs_trained,
        rng,
    } = serde_json::from_str(header).map_err(|e| corrupt(format!("invalid header: {e}")))?;

    if format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {format_version}, expected {FORMAT_VERSION}"
        )));
    }

    config
        .validate()
        .map_err(|e| corrupt(format!("invalid config: {e}")))?;

    let tensors = SafeTensors::deserialize(&bytes).map_err(|e| corrupt(e.to_string()))?;
    let (n_visible, n_hidden) = (config.n_visible, config.n_hidden);

    let read = |name: &str, shape: &[usize]| -> Result<Vec<f32>> {
        let view = tensors
            .tensor(name)
            .map_err(|_| corrupt(format!("missing tensor `{name}`")))?;

        if view.dtype() != Dtype::F32 {
            return Err(corrupt(format!(
                "tensor `{name}` has dtype {:?}, expected F32",
                view.dtype()
            )));
        }

        if view.shape() != shape {
            return Err(corrupt(format!(
                "tensor `{name}` has shape {:?}, expected {shape:?}",
                view.shape()
            )));
        }

        let values = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(values)
    };

    let read_params = |suffix: &str| -> Result<Params> {
        let w = read(&format!("{}{suffix}", Params::W), &[n_visible, n_hidden])?;
        let hb = read(&format!("{}{suffix}", Params::HB), &[n_hidden])?;
        let vb = read(&format!("{}{suffix}", Params::VB), &[n_visible])?;

        let w = Array2::from_shape_vec((n_visible, n_hidden), w)
            .map_err(|e| corrupt(e.to_string()))?;

        Params::from_parts(w, Array1::from(hb), Array1::from(vb))
    };

    let params = read_params("")?;
    let velocity = read_params(VELOCITY_SUFFIX)?;

    if let Some(param) = params.first_non_finite() {
        return Err(corrupt(format!("`{param}` holds non finite values")));
    }

    if let Some(param) = velocity.first_non_finite() {
        return Err(corrupt(format!(
            "`{param}{VELOCITY_SUFFIX}` holds non finite values"
        )));
    }

    config.model_path = Some(dir.to_path_buf());

    let optimizer = GradientAscentWithMomentum::new(
        velocity,
        config.learning_rate,
        config.momentum,
        config.l2,
    );

    debug!(
        "loaded checkpoint at epoch {epochs_trained} from {}",
        dir.display()
    );

    Ok(Checkpoint {
        units,
        config,
        state: TrainState {
            params,
            optimizer,
            rng,
            epochs_trained,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn checkpoint() -> Checkpoint {
        let config = RbmConfig::new(5, 3);
        let mut state = TrainState::init(&config).unwrap();
        state.epochs_trained = 4;
        let _: u64 = state.rng.random();

        Checkpoint {
            units: UnitKind::Multinomial,
            config,
            state,
        }
    }

    #[test]
    fn restores_the_exact_state() {
        let dir = tempfile::tempdir().unwrap();
        let Checkpoint {
            units,
            config,
            state,
        } = checkpoint();

        save(dir.path(), units, &config, &state).unwrap();
        let loaded = load(dir.path()).unwrap();

        assert_eq!(loaded.units, units);
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.config.model_path.as_deref(), Some(dir.path()));
        assert_eq!(loaded.config.n_visible, config.n_visible);
        assert!(!dir.path().join(TMP_FILE).exists());
    }

    #[test]
    fn missing_checkpoint_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nothing here")).unwrap_err();

        assert!(matches!(err, RbmErr::NotFound { .. }));
    }

    #[test]
    fn a_file_in_place_of_the_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("model");
        fs::write(&file, b"").unwrap();

        let err = load(&file).unwrap_err();
        assert!(matches!(err, RbmErr::NotFound { .. }));
    }

    #[test]
    fn non_finite_parameters_are_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let Checkpoint {
            units,
            config,
            mut state,
        } = checkpoint();
        save(dir.path(), units, &config, &state).unwrap();
        let good = state.clone();

        state.params.parts_mut().0[[1, 2]] = f32::NAN;
        let err = save(dir.path(), units, &config, &state).unwrap_err();

        assert!(matches!(err, RbmErr::CorruptState { .. }));
        assert_eq!(load(dir.path()).unwrap().state, good);
    }

    #[test]
    fn non_finite_tensors_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let Checkpoint {
            units,
            config,
            state,
        } = checkpoint();
        save(dir.path(), units, &config, &state).unwrap();

        // the file ends with the data of the last tensor
        let path = dir.path().join(CHECKPOINT_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let n = bytes.len();
        bytes[n - 4..].copy_from_slice(&f32::NAN.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, RbmErr::CorruptState { .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHECKPOINT_FILE), b"definitely not safetensors").unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, RbmErr::CorruptState { .. }));
    }

    #[test]
    fn tensors_must_match_the_recovered_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let Checkpoint {
            units,
            config,
            state,
        } = checkpoint();

        // the header claims 5x4 while the tensors are 5x3
        let lying = RbmConfig {
            n_hidden: 4,
            ..config
        };
        save(dir.path(), units, &lying, &state).unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            RbmErr::CorruptState { ref reason, .. } if reason.contains("shape")
        ));
    }

    #[test]
    fn rejects_unknown_format_versions() {
        let dir = tempfile::tempdir().unwrap();
        let Checkpoint {
            units,
            config,
            state,
        } = checkpoint();
        save(dir.path(), units, &config, &state).unwrap();

        let path = dir.path().join(CHECKPOINT_FILE);
        let bytes = fs::read(&path).unwrap();
        let needle = b"\\\"format_version\\\":1";
        let at = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();

        let mut patched = bytes.clone();
        patched[at + needle.len() - 1] = b'9';
        fs::write(&path, patched).unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            RbmErr::CorruptState { ref reason, .. } if reason.contains("version")
        ));
    }
}
