//! Schema-wide generator options (the `options` block).
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::is_valid_identifier;
use crate::error::SchemaError;
use crate::path_de::from_value_with_path;

/// How `Optional` fields are represented in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OptionalRepr {
    /// `name?: T`
    #[default]
    #[serde(alias = "json")]
    #[value(alias = "json")]
    OmittableKey,
    /// `name: T | null`
    #[serde(alias = "expnull")]
    #[value(alias = "expnull")]
    Nullable,
    /// `name: Maybe<T>` (purify-ts)
    #[serde(alias = "purify")]
    #[value(alias = "purify")]
    MonadicWrapper,
}

/// How `Map` fields are represented in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MapRepr {
    /// `Record<string, T>`
    #[default]
    #[serde(alias = "json")]
    #[value(alias = "json")]
    PlainRecord,
    /// `Map<string, T>`
    #[serde(alias = "map")]
    #[value(alias = "map")]
    AssociativeContainer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructorStyle {
    #[default]
    #[serde(alias = "positional")]
    #[value(alias = "positional")]
    PositionalArgs,
    #[serde(alias = "obj")]
    #[value(alias = "obj")]
    SingleParameterObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Options {
    /// Name of the discriminant field carried by every leaf.
    pub tag_name: String,
    pub optional: OptionalRepr,
    pub maps: MapRepr,
    pub constructor: ConstructorStyle,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tag_name: "tag".to_string(),
            optional: OptionalRepr::default(),
            maps: MapRepr::default(),
            constructor: ConstructorStyle::default(),
        }
    }
}

impl Options {
    /// Read and validate the `options` block found at `path`.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, SchemaError> {
        let options: Options = from_value_with_path(value).map_err(|err| {
            SchemaError::InvalidOption { path: err.path_under(path), message: err.message }
        })?;
        if !is_valid_identifier(&options.tag_name) {
            return Err(SchemaError::InvalidOption {
                path: format!("{path}.tagName"),
                message: format!("`{}` is not a valid discriminant name", options.tag_name),
            });
        }
        Ok(options)
    }
}
