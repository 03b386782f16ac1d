use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use crate::initialization::RandErr;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, RbmErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum RbmErr {
    /// An input array doesn't have the shape the model expects.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// Tried to change a field that is fixed once the model is constructed.
    ImmutableField { field: &'static str },
    /// There's no checkpoint at the given location.
    NotFound { path: PathBuf },
    /// The checkpoint exists but can't be turned back into a model.
    CorruptState { path: PathBuf, reason: String },
    /// An update left a parameter with NaN or infinite values.
    Divergence { epoch: usize, param: &'static str },
    /// The configuration violates one of its constraints.
    InvalidConfig(String),
    Io(io::Error),
}

impl RbmErr {
    pub(crate) fn corrupt<P, S>(path: P, reason: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        Self::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl Display for RbmErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbmErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            RbmErr::ImmutableField { field } => {
                write!(f, "the field `{field}` can't be changed after construction")
            }
            RbmErr::NotFound { path } => {
                write!(f, "no checkpoint found at {}", path.display())
            }
            RbmErr::CorruptState { path, reason } => {
                write!(f, "corrupt checkpoint at {}: {reason}", path.display())
            }
            RbmErr::Divergence { epoch, param } => write!(
                f,
                "training diverged at epoch {epoch}: `{param}` holds non finite values"
            ),
            RbmErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            RbmErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for RbmErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RbmErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RbmErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RandErr> for RbmErr {
    fn from(value: RandErr) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err = RbmErr::from(io::Error::other("disk on fire"));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "io error: disk on fire");
    }

    #[test]
    fn divergence_names_epoch_and_param() {
        let err = RbmErr::Divergence {
            epoch: 3,
            param: "W",
        };

        assert_eq!(
            err.to_string(),
            "training diverged at epoch 3: `W` holds non finite values"
        );
    }
}
