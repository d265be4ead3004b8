use crate::error::NodesError;
use std::fmt;
use std::str::FromStr;

/// The two content types a collection renders and parses fragments with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    #[default]
    Xml,
    Html,
}

impl ContentType {
    /// Normalizes `xml`, `application/xml`, `text/xml`, `html` and
    /// `text/html` (case-insensitive). Anything else is rejected.
    pub fn normalize(value: &str) -> Result<Self, NodesError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xml" | "application/xml" | "text/xml" => Ok(ContentType::Xml),
            "html" | "text/html" => Ok(ContentType::Html),
            _ => Err(NodesError::InvalidContentType(value.to_string())),
        }
    }

    /// Like [`normalize`](Self::normalize), but falls back to `text/xml`.
    /// Used when a source was loaded with a loader-specific type such as
    /// `json`.
    pub fn normalize_or_xml(value: &str) -> Self {
        Self::normalize(value).unwrap_or_else(|_| {
            log::trace!("Content type '{}' falls back to text/xml", value);
            ContentType::Xml
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Xml => "text/xml",
            ContentType::Html => "text/html",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, ContentType::Html)
    }
}

impl FromStr for ContentType {
    type Err = NodesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_table() {
        for value in ["xml", "application/xml", "text/xml", "TEXT/XML"] {
            assert_eq!(ContentType::normalize(value).unwrap(), ContentType::Xml);
        }
        for value in ["html", "text/html", "Html"] {
            assert_eq!(ContentType::normalize(value).unwrap(), ContentType::Html);
        }
        assert_eq!(ContentType::Html.to_string(), "text/html");
    }

    #[test]
    fn unknown_types_fail_or_fall_back() {
        assert!(matches!(
            "text/csv".parse::<ContentType>(),
            Err(NodesError::InvalidContentType(v)) if v == "text/csv"
        ));
        assert_eq!(ContentType::normalize_or_xml("json"), ContentType::Xml);
    }
}
