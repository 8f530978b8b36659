/// Machine-readable category for a fit failure.
///
/// Every failure the engine can produce is one of these kinds. They are all
/// local, recoverable-by-caller outcomes; the engine never panics across its
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitErrorKind {
    /// Fewer usable points than the model's parameter count, or fewer than 3
    /// points overall.
    InsufficientData,
    /// A model-specific domain constraint left too few points after filtering
    /// (e.g. no positive-y rows remain for an exponential fit).
    InvalidDomain,
    /// A custom formula failed to parse, referenced a disallowed name, or has
    /// no free parameters to fit.
    Expression,
    /// The iterative solver exhausted its evaluation budget or encountered a
    /// singular system.
    Convergence,
    /// The model identifier is not one of the known catalog names or "custom".
    UnknownModel,
    /// R² requested on a sample with zero y-variance. This kind never aborts
    /// a fit; it only voids the R² field of the result.
    UndefinedScore,
}

#[derive(Clone)]
pub struct FitError {
    kind: FitErrorKind,
    message: String,
}

impl FitError {
    pub fn new(kind: FitErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FitErrorKind {
        self.kind
    }

    /// Process exit code for the demo binary.
    pub fn exit_code(&self) -> u8 {
        match self.kind {
            FitErrorKind::UnknownModel | FitErrorKind::Expression => 2,
            FitErrorKind::InsufficientData | FitErrorKind::InvalidDomain => 3,
            FitErrorKind::Convergence | FitErrorKind::UndefinedScore => 4,
        }
    }
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for FitError {}
