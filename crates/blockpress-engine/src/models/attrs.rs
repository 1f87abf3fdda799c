use std::collections::BTreeMap;

use super::values::GalleryImage;

/// A single attribute value on a node.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Images(Vec<GalleryImage>),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_images(&self) -> Option<&[GalleryImage]> {
        match self {
            AttrValue::Images(images) => Some(images),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Number(f64::from(value))
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

impl From<Vec<GalleryImage>> for AttrValue {
    fn from(value: Vec<GalleryImage>) -> Self {
        AttrValue::Images(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Null, Into::into)
    }
}

/// Attribute map of a node, keyed by the schema's attribute names.
///
/// Typed getters return a neutral value (empty string, `None`, `false`) when
/// the attribute is absent or holds another variant; schema normalization
/// guarantees every declared attribute is present after load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attrs {
    values: BTreeMap<&'static str, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<AttrValue>) {
        self.values.insert(name, value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(AttrValue::as_text).unwrap_or("")
    }

    /// Text value, treating `Null` and the empty string as absent.
    pub fn opt_text(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(AttrValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_number)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(AttrValue::as_bool).unwrap_or(false)
    }

    pub fn images(&self, name: &str) -> &[GalleryImage] {
        self.get(name).and_then(AttrValue::as_images).unwrap_or(&[])
    }

    pub fn images_mut(&mut self, name: &str) -> Option<&mut Vec<GalleryImage>> {
        match self.values.get_mut(name) {
            Some(AttrValue::Images(images)) => Some(images),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keeps only the attributes accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.values.retain(|k, _| keep(k));
    }
}
