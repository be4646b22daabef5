use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    RequestFailed(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RequestFailed(_) => ExitCode::RequestFailed,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::RequestFailed(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<apib_core::runner::Error> for RunError {
    fn from(err: apib_core::runner::Error) -> Self {
        use apib_core::runner::Error;
        match err {
            Error::InvalidWorkers | Error::InvalidPrintInterval | Error::InvalidTimeout => {
                Self::InvalidInput(err.into())
            }
            Error::Http(e) if e.kind() == apib_core::ErrorKind::Configuration => {
                Self::InvalidInput(e.into())
            }
            Error::Http(_) | Error::Join(_) => Self::RuntimeError(err.into()),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
