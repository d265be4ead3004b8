use arbor_dom::DomError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadingError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 string error: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed source at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Loader for '{0}' cannot parse fragments")]
    FragmentNotSupported(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl LoadingError {
    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        LoadingError::Malformed {
            position,
            message: message.into(),
        }
    }
}
