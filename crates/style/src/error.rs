use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("Invalid style property name '{0}'")]
    InvalidPropertyName(String),

    #[error("Style parse error: {0}")]
    Parse(String),
}
