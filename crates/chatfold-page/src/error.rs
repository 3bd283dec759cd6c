use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("no element at {0}")]
    NoSuchElement(String),

    #[error("could not locate a chat titled \"{0}\" on the page")]
    TargetNotFound(String),

    #[error("navigation failed: {0}")]
    Navigation(String),
}
