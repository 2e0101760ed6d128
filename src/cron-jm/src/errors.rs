use data_model_jm::StoreError;

#[derive(Debug)]
pub enum Error {
    StoreError(StoreError),
    CoreError(core_jm::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreError(e) => write!(f, "Store error: {}", e),
            Self::CoreError(e) => write!(f, "Core error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::StoreError(error)
    }
}

impl From<core_jm::Error> for Error {
    fn from(error: core_jm::Error) -> Self {
        Self::CoreError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::StoreError(StoreError::Pool("connection refused".to_string()));
        assert_eq!(error.to_string(), "Store error: Database pool error: connection refused");

        let error = Error::CoreError(core_jm::Error::Browser("crashed".to_string()));
        assert_eq!(error.to_string(), "Core error: Browser error: crashed");
    }

    #[test]
    fn test_error_from_core_error() {
        let error: Error = core_jm::Error::SelectorMissing("ul".to_string()).into();
        assert!(matches!(error, Error::CoreError(core_jm::Error::SelectorMissing(_))));
    }
}
