//! Document element tree and the typed attribute reader.
//!
//! An [`Element`] is the loosely typed node that schema objects load from:
//! a kind name, string attributes, an optional text value and child elements.
//! Values are looked up either as attributes or as the text of a child
//! element of the same name, so `<noise type="gaussian"><mean>0.1</mean></noise>`
//! exposes both `type` and `mean`.
//!
//! [`AttributeReader`] wraps the default-and-validate procedure every schema
//! object follows when it loads:
//!
//! ```ignore
//! let mut reader = AttributeReader::new(&element, "noise", "Noise")?;
//! let kind = reader.token("type", NoiseType::None);
//! let mean = reader.optional("mean", 0.0);
//! let errors = reader.finish();
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sdf_math::Color;

use crate::error::{Error, ErrorCode, Errors};

/// Shared handle to an element, kept by schema objects as provenance.
pub type ElementPtr = Arc<Element>;

/// A node of the document tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    value: Option<String>,
    children: Vec<ElementPtr>,
}

impl Element {
    /// Create an empty element of the given kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set an attribute, replacing any previous value for `key`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    /// Set the text value of this element.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Shorthand for a child element holding only a text value.
    pub fn with_child_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(Element::new(name).with_value(value))
    }

    pub fn into_ptr(self) -> ElementPtr {
        Arc::new(self)
    }

    /// Declared element kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &ElementPtr> {
        self.children.iter()
    }

    /// First child element of the given kind.
    pub fn first_child(&self, name: &str) -> Option<&ElementPtr> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Raw text for `key`, from an attribute or else a child element's value.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.attribute(key)
            .or_else(|| self.first_child(key).and_then(|c| c.value()))
    }

    /// Look up `key` and parse it as `T`.
    pub fn lookup<T: FromAttribute>(&self, key: &str) -> Lookup<T> {
        match self.raw(key) {
            None => Lookup::Missing,
            Some(text) => match T::from_attribute(text) {
                Some(value) => Lookup::Present(value),
                None => Lookup::Invalid(text.to_string()),
            },
        }
    }

    /// Typed lookup with a default. The flag is true only when the value was
    /// present and well formed.
    pub fn get<T: FromAttribute>(&self, key: &str, default: T) -> (T, bool) {
        match self.lookup(key) {
            Lookup::Present(value) => (value, true),
            Lookup::Missing | Lookup::Invalid(_) => (default, false),
        }
    }
}

/// Outcome of a typed lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Present(T),
    Missing,
    /// Present, but the text did not parse. Holds the offending text.
    Invalid(String),
}

/// Values that can be parsed from element text.
pub trait FromAttribute: Sized {
    fn from_attribute(text: &str) -> Option<Self>;
}

impl FromAttribute for String {
    fn from_attribute(text: &str) -> Option<Self> {
        Some(text.trim().to_string())
    }
}

impl FromAttribute for bool {
    fn from_attribute(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

macro_rules! from_attribute_via_parse {
    ($($t:ty),*) => {
        $(
            impl FromAttribute for $t {
                fn from_attribute(text: &str) -> Option<Self> {
                    text.trim().parse::<$t>().ok()
                }
            }
        )*
    };
}

from_attribute_via_parse!(f32, f64, i32, u32);

/// Whitespace separated `r g b [a]`; alpha defaults to 1.
impl FromAttribute for Color {
    fn from_attribute(text: &str) -> Option<Self> {
        let parts = text
            .split_whitespace()
            .map(|s| s.parse::<f32>().ok())
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Color::new(*r, *g, *b, *a)),
            _ => None,
        }
    }
}

/// Reads typed attributes from one element into a schema object, collecting
/// validation errors instead of stopping at the first one.
pub struct AttributeReader<'a> {
    element: &'a Element,
    context: &'a str,
    errors: Errors,
}

impl<'a> AttributeReader<'a> {
    /// Start reading `element` on behalf of a `context` object (e.g. `"Noise"`).
    ///
    /// Fails with [`ErrorCode::ElementIncorrectType`] when the element is not
    /// of kind `expected`; the caller must not read anything in that case.
    pub fn new(element: &'a Element, expected: &str, context: &'a str) -> Result<Self, Error> {
        if element.name() != expected {
            return Err(Error::new(
                ErrorCode::ElementIncorrectType,
                format!(
                    "Attempting to load a {context}, but the provided element is a <{}>, not a <{expected}>.",
                    element.name()
                ),
            ));
        }

        Ok(Self {
            element,
            context,
            errors: Errors::new(),
        })
    }

    /// Read `key`; record [`ErrorCode::ElementMissing`] if it is absent.
    pub fn required<T: FromAttribute + fmt::Debug>(&mut self, key: &str, default: T) -> T {
        match self.element.lookup(key) {
            Lookup::Present(value) => value,
            Lookup::Missing => {
                self.push(
                    ErrorCode::ElementMissing,
                    format!(
                        "{} is missing the {key} attribute. Defaulting to {default:?}.",
                        self.context
                    ),
                );
                default
            }
            Lookup::Invalid(text) => self.invalid(key, &text, default),
        }
    }

    /// Read `key`, silently falling back to `default` when it is absent.
    pub fn optional<T: FromAttribute + fmt::Debug>(&mut self, key: &str, default: T) -> T {
        match self.element.lookup(key) {
            Lookup::Present(value) => value,
            Lookup::Missing => default,
            Lookup::Invalid(text) => self.invalid(key, &text, default),
        }
    }

    /// Read a required token from a fixed vocabulary.
    ///
    /// `T::from_str` is tried on the lower-cased text; unknown tokens record
    /// [`ErrorCode::ElementInvalid`] with the offending text and yield `default`.
    pub fn token<T>(&mut self, key: &str, default: T) -> T
    where
        T: FromStr + fmt::Display,
    {
        let Some(text) = self.element.raw(key) else {
            self.push(
                ErrorCode::ElementMissing,
                format!(
                    "{} is missing the {key} attribute. Defaulting to '{default}'.",
                    self.context
                ),
            );
            return default;
        };

        match text.trim().to_ascii_lowercase().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                self.push(
                    ErrorCode::ElementInvalid,
                    format!(
                        "{} '{key}' attribute is invalid with a value of [{text}]. Using a value of '{default}'.",
                        self.context
                    ),
                );
                default
            }
        }
    }

    /// Finish reading and hand back the accumulated errors.
    pub fn finish(self) -> Errors {
        self.errors
    }

    fn invalid<T: fmt::Debug>(&mut self, key: &str, text: &str, default: T) -> T {
        self.push(
            ErrorCode::ElementInvalid,
            format!(
                "{} '{key}' has an invalid value of [{text}]. Using {default:?}.",
                self.context
            ),
        );
        default
    }

    fn push(&mut self, code: ErrorCode, message: String) {
        log::debug!("{message}");
        self.errors.push(Error::new(code, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("noise")
            .with_attribute("type", "gaussian")
            .with_child_value("mean", "0.5")
            .with_child_value("stddev", "abc")
    }

    #[test]
    fn test_get_attribute_and_child_value() {
        let elem = sample();
        assert_eq!(elem.get("type", String::new()), ("gaussian".to_string(), true));
        assert_eq!(elem.get("mean", 0.0_f64), (0.5, true));
    }

    #[test]
    fn test_get_missing_uses_default() {
        let elem = sample();
        assert_eq!(elem.get("precision", 2.0_f64), (2.0, false));
    }

    #[test]
    fn test_lookup_invalid_keeps_text() {
        let elem = sample();
        assert_eq!(elem.lookup::<f64>("stddev"), Lookup::Invalid("abc".to_string()));
    }

    #[test]
    fn test_attribute_overrides_child() {
        let elem = Element::new("x")
            .with_child_value("k", "1")
            .with_attribute("k", "2");
        assert_eq!(elem.get("k", 0_i32), (2, true));
    }

    #[test]
    fn test_parse_color_and_bool() {
        assert_eq!(
            Color::from_attribute("0.1 0.2 0.3"),
            Some(Color::rgb(0.1, 0.2, 0.3))
        );
        assert_eq!(
            Color::from_attribute("0.1 0.2 0.3 0.5"),
            Some(Color::new(0.1, 0.2, 0.3, 0.5))
        );
        assert_eq!(Color::from_attribute("0.1 0.2"), None);
        assert_eq!(bool::from_attribute("TRUE"), Some(true));
        assert_eq!(bool::from_attribute("0"), Some(false));
        assert_eq!(bool::from_attribute("maybe"), None);
    }

    #[test]
    fn test_reader_rejects_wrong_kind() {
        let elem = Element::new("camera");
        let err = AttributeReader::new(&elem, "noise", "Noise").err().unwrap();
        assert_eq!(err.code, ErrorCode::ElementIncorrectType);
        assert!(err.message.contains("camera"));
    }

    #[test]
    fn test_reader_accumulates_errors() {
        let elem = sample();
        let mut reader = AttributeReader::new(&elem, "noise", "Noise").unwrap();

        let mean = reader.optional("mean", 0.0_f64);
        let std_dev = reader.optional("stddev", 0.0_f64);
        let bias: f64 = reader.required("bias_mean", 0.25);
        let precision = reader.optional("precision", 0.0_f64);

        assert_eq!(mean, 0.5);
        assert_eq!(std_dev, 0.0);
        assert_eq!(bias, 0.25);
        assert_eq!(precision, 0.0);

        let errors = reader.finish();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, ErrorCode::ElementInvalid);
        assert!(errors[0].message.contains("abc"));
        assert_eq!(errors[1].code, ErrorCode::ElementMissing);
        assert!(errors[1].message.contains("bias_mean"));
    }
}
