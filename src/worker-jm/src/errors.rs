use data_model_jm::StoreError;

#[derive(Debug)]
pub enum Error {
    StoreError(StoreError),
    CoreError(core_jm::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreError(store_error) => write!(f, "{}", store_error),
            Self::CoreError(core_error) => write!(f, "{}", core_error),
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
