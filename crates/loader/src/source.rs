use crate::error::LoadingError;
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

/// What a loader reads from.
#[derive(Debug, Clone, Copy)]
pub enum LoadSource<'a> {
    /// Markup or JSON text.
    Text(&'a str),
    /// A file read as UTF-8.
    File(&'a Path),
    /// An already decoded JSON value.
    Json(&'a Value),
}

impl<'a> LoadSource<'a> {
    /// The source as text. `None` for decoded JSON values.
    pub fn read(&self) -> Result<Option<Cow<'a, str>>, LoadingError> {
        match *self {
            LoadSource::Text(text) => Ok(Some(Cow::Borrowed(text))),
            LoadSource::File(path) => {
                log::debug!("Reading source file {}", path.display());
                std::fs::read_to_string(path)
                    .map(|s| Some(Cow::Owned(s)))
                    .map_err(|source| LoadingError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
            }
            LoadSource::Json(_) => Ok(None),
        }
    }
}

impl<'a> From<&'a str> for LoadSource<'a> {
    fn from(text: &'a str) -> Self {
        LoadSource::Text(text)
    }
}

impl<'a> From<&'a String> for LoadSource<'a> {
    fn from(text: &'a String) -> Self {
        LoadSource::Text(text)
    }
}

impl<'a> From<&'a Path> for LoadSource<'a> {
    fn from(path: &'a Path) -> Self {
        LoadSource::File(path)
    }
}

impl<'a> From<&'a Value> for LoadSource<'a> {
    fn from(value: &'a Value) -> Self {
        LoadSource::Json(value)
    }
}
