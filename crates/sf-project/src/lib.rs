//! sf-project: sweep definition file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_definition};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn parse_yaml(content: &str) -> ProjectResult<SweepDefinition> {
    let definition: SweepDefinition = serde_yaml::from_str(content)?;
    validate_definition(&definition)?;
    Ok(definition)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<SweepDefinition> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn save_yaml(path: &std::path::Path, definition: &SweepDefinition) -> ProjectResult<()> {
    validate_definition(definition)?;
    let content = serde_yaml::to_string(definition)?;
    std::fs::write(path, content)?;
    Ok(())
}
