// src/error.rs
use arbor_dom::DomError;
use arbor_loader::LoadingError;
use arbor_style::StyleError;
use arbor_xpath1::XPathError;
use thiserror::Error;

/// Errors raised by node collections and the query API.
#[derive(Error, Debug)]
pub enum NodesError {
    #[error("Source does not match any loader or supported type")]
    InvalidSource,

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Selector '{0}' did not return a node list")]
    InvalidSelectorResult(String),

    #[error("Invalid elements: {0}")]
    InvalidElements(String),

    #[error("Node at index {0} belongs to a different document")]
    ForeignNode(usize),

    #[error("Unsupported content type '{0}'")]
    InvalidContentType(String),

    #[error("Loader for '{0}' cannot parse fragments")]
    InvalidFragmentLoader(String),

    #[error("Loading failed: {0}")]
    Loading(LoadingError),

    #[error("Property '{0}' is read-only")]
    ReadOnlyProperty(&'static str),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("Style error: {0}")]
    Style(#[from] StyleError),

    #[error("Invalid attribute name '{0}'")]
    InvalidAttributeName(String),
}

impl From<LoadingError> for NodesError {
    fn from(e: LoadingError) -> Self {
        match e {
            LoadingError::FragmentNotSupported(content_type) => {
                NodesError::InvalidFragmentLoader(content_type)
            }
            other => NodesError::Loading(other),
        }
    }
}

impl From<XPathError> for NodesError {
    fn from(e: XPathError) -> Self {
        NodesError::Dom(DomError::XPath(e))
    }
}
