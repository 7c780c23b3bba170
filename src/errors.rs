use std::{
    error::Error,
    fmt::{self, Display},
};

#[derive(Debug)]
pub enum SvgCreationError {
    NullGeometry,
}

impl std::error::Error for SvgCreationError {}

impl fmt::Display for SvgCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SvgCreationError::NullGeometry => write!(f, "Empty/Invalid/Dimensionless geometry"),
        }
    }
}

/// Failures while turning a linked pass into a plotter program.
#[derive(Debug)]
pub enum PostError {
    NoSuchTemplate(String),
    TemplateError(String),
}

impl Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostError::NoSuchTemplate(name) => write!(f, "Missing post template '{}'", name),
            PostError::TemplateError(msg) => write!(f, "Post template failed: {}", msg),
        }
    }
}

impl Error for PostError {}

impl From<tera::Error> for PostError {
    fn from(error: tera::Error) -> Self {
        PostError::TemplateError(error.to_string())
    }
}

/// Reasons a generation run stops without handing back drawing passes.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// A newer run was started; this one noticed at a yield point.
    Superseded,
    /// The run gave up after reporting why (eg. an image that would not load).
    Abandoned(String),
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Superseded => write!(f, "Run superseded by a newer configuration"),
            GenerateError::Abandoned(reason) => write!(f, "Run abandoned: {}", reason),
        }
    }
}

impl Error for GenerateError {}

#[derive(Debug)]
pub enum ConfigError {
    Parse(String),
    Serialize(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Invalid plot configuration: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Could not serialize configuration: {}", msg),
        }
    }
}

impl Error for ConfigError {}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(error: ron::error::SpannedError) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

impl From<ron::Error> for ConfigError {
    fn from(error: ron::Error) -> Self {
        ConfigError::Serialize(error.to_string())
    }
}
