use arbor_xpath1::XPathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Node belongs to a different document")]
    WrongDocument,

    #[error("Reference node is not a child of this node")]
    NotFound,

    #[error("Invalid name '{0}'")]
    InvalidName(String),

    #[error(transparent)]
    XPath(#[from] XPathError),

    #[error("Serialization failed: {0}")]
    Io(#[from] std::io::Error),
}
