//! Sparse, validated catalog edits.
//!
//! Callers hand in a loosely-typed field map (e.g. a JSON object). It is turned
//! into a [`ProductEdits`] before anything is mutated; the first unknown field or
//! wrong-typed value rejects the whole set.

use serde_json::{Map, Value};
use thiserror::Error;

/// Fields a catalog entry accepts edits for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProductField {
    Code,
    Name,
    Price,
    ImageUrl,
}

impl ProductField {
    pub const ALL: [ProductField; 4] = [
        ProductField::Code,
        ProductField::Name,
        ProductField::Price,
        ProductField::ImageUrl,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductField::Code => "code",
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::ImageUrl => "imageURL",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn expected_type(self) -> &'static str {
        match self {
            ProductField::Price => "number",
            _ => "string",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProductField::Code => "product code",
            ProductField::Name => "product name",
            ProductField::Price => "product price",
            ProductField::ImageUrl => "product image",
        }
    }
}

impl core::fmt::Display for ProductField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field map was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldEditError {
    #[error("'{field}' field doesn't exist in product model")]
    UnknownField { field: String },

    #[error("invalid type for '{field}' field: expected {expected}, found {found} ({value})")]
    TypeMismatch {
        field: ProductField,
        expected: &'static str,
        found: &'static str,
        value: String,
    },
}

impl FieldEditError {
    /// Short message suitable for the caller.
    pub fn user_message(&self) -> String {
        match self {
            FieldEditError::UnknownField { field } => {
                format!("the field '{field}' does not exist in the product model")
            }
            FieldEditError::TypeMismatch { field, .. } => {
                format!("the value for the {} is invalid", field.label())
            }
        }
    }
}

/// One optional slot per editable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductEdits {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

impl ProductEdits {
    /// Validate a field map. Keys are visited in map order; the first invalid
    /// entry aborts and nothing is returned.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, FieldEditError> {
        let mut edits = Self::default();
        for (key, value) in fields {
            let field = ProductField::parse(key).ok_or_else(|| FieldEditError::UnknownField {
                field: key.clone(),
            })?;

            match field {
                ProductField::Code => edits.code = Some(expect_string(field, value)?),
                ProductField::Name => edits.name = Some(expect_string(field, value)?),
                ProductField::ImageUrl => edits.image_url = Some(expect_string(field, value)?),
                ProductField::Price => {
                    edits.price = Some(value.as_f64().ok_or_else(|| mismatch(field, value))?)
                }
            }
        }
        Ok(edits)
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.name.is_none() && self.price.is_none() && self.image_url.is_none()
    }
}

fn expect_string(field: ProductField, value: &Value) -> Result<String, FieldEditError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(field, value))
}

fn mismatch(field: ProductField, value: &Value) -> FieldEditError {
    FieldEditError::TypeMismatch {
        field,
        expected: field.expected_type(),
        found: json_type(value),
        value: value.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
