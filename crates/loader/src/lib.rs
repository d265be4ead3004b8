//! Loaders turn markup, JSON and files into `arbor-dom` documents.
//!
//! Every loader implements [`Loadable`]; [`Loaders`] tries registered
//! loaders in order and returns the first document produced.

pub mod error;
pub mod html;
pub mod json;
pub mod options;
mod sink;
pub mod source;
pub mod xml;

pub use error::LoadingError;
pub use html::HtmlLoader;
pub use json::{JSON_NAMESPACE, JsonLoader};
pub use options::LoaderOptions;
pub use source::LoadSource;
pub use xml::XmlLoader;

use arbor_dom::{DocumentRef, Node};
use std::fmt;
use std::rc::Rc;

/// A source format that can be turned into a document.
pub trait Loadable {
    fn supports(&self, content_type: &str) -> bool;

    /// Returns `Ok(None)` when the loader does not handle this source or
    /// content type, so the next loader can try.
    fn load(
        &self,
        source: &LoadSource<'_>,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<DocumentRef>, LoadingError>;

    /// Parses markup into detached nodes owned by `target`.
    fn load_fragment(
        &self,
        _source: &str,
        content_type: &str,
        _target: &DocumentRef,
        _options: &LoaderOptions,
    ) -> Result<Vec<Node>, LoadingError> {
        Err(LoadingError::FragmentNotSupported(content_type.to_string()))
    }
}

/// An ordered set of loaders.
#[derive(Clone)]
pub struct Loaders {
    loaders: Vec<Rc<dyn Loadable>>,
}

impl fmt::Debug for Loaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaders")
            .field("count", &self.loaders.len())
            .finish()
    }
}

impl Default for Loaders {
    /// XML, HTML and JSON.
    fn default() -> Self {
        Self::empty()
            .with(XmlLoader)
            .with(HtmlLoader)
            .with(JsonLoader)
    }
}

impl Loaders {
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    pub fn with(mut self, loader: impl Loadable + 'static) -> Self {
        self.add(loader);
        self
    }

    pub fn add(&mut self, loader: impl Loadable + 'static) {
        self.loaders.push(Rc::new(loader));
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl Loadable for Loaders {
    fn supports(&self, content_type: &str) -> bool {
        self.loaders.iter().any(|l| l.supports(content_type))
    }

    fn load(
        &self,
        source: &LoadSource<'_>,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<DocumentRef>, LoadingError> {
        for loader in self.loaders.iter().filter(|l| l.supports(content_type)) {
            if let Some(doc) = loader.load(source, content_type, options)? {
                log::debug!("Loaded '{}' source", content_type);
                return Ok(Some(doc));
            }
        }
        log::debug!("No loader produced a document for '{}'", content_type);
        Ok(None)
    }

    /// Uses the first loader supporting `content_type`.
    fn load_fragment(
        &self,
        source: &str,
        content_type: &str,
        target: &DocumentRef,
        options: &LoaderOptions,
    ) -> Result<Vec<Node>, LoadingError> {
        match self.loaders.iter().find(|l| l.supports(content_type)) {
            Some(loader) => {
                log::trace!("Parsing '{}' fragment ({} bytes)", content_type, source.len());
                loader.load_fragment(source, content_type, target, options)
            }
            None => Err(LoadingError::FragmentNotSupported(content_type.to_string())),
        }
    }
}
