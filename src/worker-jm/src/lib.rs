pub mod errors;
pub mod work;

pub use errors::Error;

pub use work::{
    EnrichmentConfig, EnrichmentProcessor, EnrichmentReport, EnrichmentResult, handle_posting, handle_result,
};
