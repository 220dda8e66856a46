//! Values carried by store attributes and array leaves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(#[serde(with = "nan_scalar")] f64),
    Text(String),
}

impl AttrValue {
    /// Text content, if this is a text attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Number(_) => None,
        }
    }

    /// Numeric content, if this is a numeric attribute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    /// View the scalar as a length-1 array.
    pub fn to_array(&self) -> ArrayData {
        match self {
            AttrValue::Number(n) => ArrayData::Numeric(vec![*n]),
            AttrValue::Text(s) => ArrayData::Text(vec![s.clone()]),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

/// An array-valued leaf. NaN is stored as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayData {
    Numeric(#[serde(with = "nan_vec")] Vec<f64>),
    Text(Vec<String>),
}

impl ArrayData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Numeric(v) => v.len(),
            ArrayData::Text(v) => v.len(),
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric content, if numeric.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ArrayData::Numeric(v) => Some(v),
            ArrayData::Text(_) => None,
        }
    }

    /// Every element rendered as text.
    pub fn to_text(&self) -> Vec<String> {
        match self {
            ArrayData::Numeric(v) => v.iter().map(|n| n.to_string()).collect(),
            ArrayData::Text(v) => v.clone(),
        }
    }

    /// Convert into a text array.
    pub fn into_text(self) -> ArrayData {
        match self {
            ArrayData::Text(_) => self,
            numeric => ArrayData::Text(numeric.to_text()),
        }
    }

    /// Concatenate arrays in order. The result is numeric only if every part
    /// is numeric; any text part turns the whole result into text.
    pub fn concat(parts: &[ArrayData]) -> ArrayData {
        let numeric: Option<Vec<&[f64]>> = parts.iter().map(|p| p.as_numeric()).collect();

        match numeric {
            Some(slices) => ArrayData::Numeric(crate::reshape::to_concatenated_vector(&slices)),
            None => {
                let texts: Vec<Vec<String>> = parts.iter().map(|p| p.to_text()).collect();
                ArrayData::Text(crate::reshape::to_concatenated_vector(&texts))
            }
        }
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(values: Vec<f64>) -> Self {
        ArrayData::Numeric(values)
    }
}

impl From<Vec<String>> for ArrayData {
    fn from(values: Vec<String>) -> Self {
        ArrayData::Text(values)
    }
}

mod nan_scalar {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

mod nan_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
