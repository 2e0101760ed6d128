use std::time::Duration;

use data_model_jm::StoreError;

/// Error type for crawling, detail extraction and enrichment.
#[derive(Debug)]
pub enum Error {
    /// Navigation did not finish within its timeout.
    NavigationTimeout { url: String, timeout: Duration },

    /// None of the expected selectors appeared on the page.
    SelectorMissing(String),

    /// A result card or service response could not be interpreted.
    ParseFailure(String),

    /// The automated browser could not be launched or stopped responding.
    Browser(String),

    /// A search URL could not be built.
    InvalidUrl(url::ParseError),

    /// The language-exclusion pattern is not a valid regex.
    InvalidPattern(regex::Error),

    /// Transport failure talking to the text generation service.
    HttpError(reqwest::Error),

    /// The text generation service answered but did not produce usable text.
    GenerationServiceFailure(String),

    /// A required setting (credential, endpoint) is absent.
    ConfigurationMissing(String),

    /// Internal error: prompt substitution failed.
    PromptCreationFailure(subst::Error),

    /// Error calling ChatGPT
    ChatGptError(async_openai::error::OpenAIError),

    /// Job store failure.
    Store(StoreError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NavigationTimeout { url, timeout } => {
                write!(f, "Navigation to {} timed out after {:?}", url, timeout)
            }
            Error::SelectorMissing(selector) => write!(f, "No element matched selector '{}'", selector),
            Error::ParseFailure(msg) => write!(f, "Parse failure: {}", msg),
            Error::Browser(msg) => write!(f, "Browser error: {}", msg),
            Error::InvalidUrl(err) => write!(f, "Not a valid URL: {}", err),
            Error::InvalidPattern(err) => write!(f, "Invalid exclusion pattern: {}", err),
            Error::HttpError(err) => write!(f, "HTTP error: {}", err),
            Error::GenerationServiceFailure(msg) => write!(f, "Text generation failed: {}", msg),
            Error::ConfigurationMissing(what) => write!(f, "Missing configuration: {}", what),
            Error::PromptCreationFailure(err) => write!(f, "Failed to create prompt: {}", err),
            Error::ChatGptError(err) => write!(f, "Error calling ChatGPT: {}", err),
            Error::Store(err) => write!(f, "Job store error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Soft failures degrade a single unit of work and are expected during normal crawling.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::NavigationTimeout { .. } | Error::SelectorMissing(_) | Error::ParseFailure(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidPattern(err)
    }
}

impl From<subst::Error> for Error {
    fn from(err: subst::Error) -> Self {
        Error::PromptCreationFailure(err)
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Error::ChatGptError(err)
    }
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Browser(err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::NavigationTimeout {
            url: "https://www.linkedin.com/jobs/view/1".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            error.to_string(),
            "Navigation to https://www.linkedin.com/jobs/view/1 timed out after 30s"
        );

        let error = Error::ConfigurationMissing("OPENAI_API_KEY".to_string());
        assert_eq!(error.to_string(), "Missing configuration: OPENAI_API_KEY");
    }

    #[test]
    fn test_soft_errors() {
        assert!(Error::SelectorMissing("#job-details".to_string()).is_soft());
        assert!(Error::ParseFailure("card without title".to_string()).is_soft());
        assert!(!Error::Browser("crashed".to_string()).is_soft());
        assert!(!Error::Store(StoreError::DuplicateKey("u".to_string())).is_soft());
    }

    #[test]
    fn test_error_from_url_parse_error() {
        let url_error = url::Url::parse("not a valid url").unwrap_err();
        let error: Error = url_error.into();
        assert!(matches!(error, Error::InvalidUrl(_)));
    }
}
