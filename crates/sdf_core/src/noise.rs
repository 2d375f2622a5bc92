//! Sensor noise descriptor.

use std::fmt;
use std::str::FromStr;

use sdf_math::equal;
use serde::{Deserialize, Serialize};

use crate::element::{AttributeReader, ElementPtr};
use crate::error::Errors;

/// The noise model applied to a sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseType {
    /// No noise.
    #[default]
    None,

    /// Gaussian noise.
    Gaussian,

    /// Gaussian noise plus quantization of the output.
    GaussianQuantized,
}

impl NoiseType {
    /// The token used for this type in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            NoiseType::None => "none",
            NoiseType::Gaussian => "gaussian",
            NoiseType::GaussianQuantized => "gaussian_quantized",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive.
impl FromStr for NoiseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(NoiseType::None),
            "gaussian" => Ok(NoiseType::Gaussian),
            "gaussian_quantized" => Ok(NoiseType::GaussianQuantized),
            _ => Err(s.to_string()),
        }
    }
}

/// Noise parameters loaded from a `<noise>` element.
///
/// Equality compares the numeric fields with a tolerance and ignores the
/// element the noise was loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Noise {
    #[serde(rename = "type")]
    noise_type: NoiseType,
    mean: f64,
    std_dev: f64,
    bias_mean: f64,
    bias_std_dev: f64,
    precision: f64,
    #[serde(skip)]
    element: Option<ElementPtr>,
}

impl Noise {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load noise parameters from `element`.
    ///
    /// A non-`<noise>` element yields a single fatal error and leaves `self`
    /// untouched. Otherwise every field is read; a missing or unknown `type`
    /// is reported and falls back to [`NoiseType::None`], and absent numeric
    /// fields keep their current values.
    pub fn load(&mut self, element: ElementPtr) -> Errors {
        let mut reader = match AttributeReader::new(&element, "noise", "Noise") {
            Ok(reader) => reader,
            Err(err) => return vec![err],
        };

        self.noise_type = reader.token("type", NoiseType::None);
        self.mean = reader.optional("mean", self.mean);
        self.std_dev = reader.optional("stddev", self.std_dev);
        self.bias_mean = reader.optional("bias_mean", self.bias_mean);
        self.bias_std_dev = reader.optional("bias_stddev", self.bias_std_dev);
        self.precision = reader.optional("precision", self.precision);

        let errors = reader.finish();
        self.element = Some(element);
        errors
    }

    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    pub fn set_noise_type(&mut self, noise_type: NoiseType) {
        self.noise_type = noise_type;
    }

    /// Mean of the Gaussian distribution.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn set_mean(&mut self, mean: f64) {
        self.mean = mean;
    }

    /// Standard deviation of the Gaussian distribution.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn set_std_dev(&mut self, std_dev: f64) {
        self.std_dev = std_dev;
    }

    /// Mean of the Gaussian distribution the bias is drawn from.
    pub fn bias_mean(&self) -> f64 {
        self.bias_mean
    }

    pub fn set_bias_mean(&mut self, bias_mean: f64) {
        self.bias_mean = bias_mean;
    }

    /// Standard deviation of the Gaussian distribution the bias is drawn from.
    pub fn bias_std_dev(&self) -> f64 {
        self.bias_std_dev
    }

    pub fn set_bias_std_dev(&mut self, bias_std_dev: f64) {
        self.bias_std_dev = bias_std_dev;
    }

    /// Quantization step for [`NoiseType::GaussianQuantized`].
    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    /// The element this noise was loaded from, if any.
    pub fn element(&self) -> Option<&ElementPtr> {
        self.element.as_ref()
    }
}

impl PartialEq for Noise {
    fn eq(&self, other: &Self) -> bool {
        self.noise_type == other.noise_type
            && equal(self.mean, other.mean)
            && equal(self.std_dev, other.std_dev)
            && equal(self.bias_mean, other.bias_mean)
            && equal(self.bias_std_dev, other.bias_std_dev)
            && equal(self.precision, other.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::error::ErrorCode;

    #[test]
    fn test_default_construction() {
        let noise = Noise::new();
        assert_eq!(noise.noise_type(), NoiseType::None);
        assert_eq!(noise.mean(), 0.0);
        assert_eq!(noise.std_dev(), 0.0);
        assert_eq!(noise.bias_mean(), 0.0);
        assert_eq!(noise.bias_std_dev(), 0.0);
        assert_eq!(noise.precision(), 0.0);
        assert!(noise.element().is_none());
    }

    #[test]
    fn test_set_get() {
        let mut noise = Noise::new();
        noise.set_noise_type(NoiseType::GaussianQuantized);
        noise.set_mean(1.2);
        noise.set_std_dev(2.3);
        noise.set_bias_mean(4.5);
        noise.set_bias_std_dev(6.7);
        noise.set_precision(8.9);

        assert_eq!(noise.noise_type(), NoiseType::GaussianQuantized);
        assert_eq!(noise.mean(), 1.2);
        assert_eq!(noise.std_dev(), 2.3);
        assert_eq!(noise.bias_mean(), 4.5);
        assert_eq!(noise.bias_std_dev(), 6.7);
        assert_eq!(noise.precision(), 8.9);

        let copy = noise.clone();
        assert_eq!(copy, noise);
        noise.set_mean(0.0);
        assert_ne!(copy, noise);
    }

    #[test]
    fn test_load_full() {
        let element = Element::new("noise")
            .with_attribute("type", "Gaussian_Quantized")
            .with_child_value("mean", "0.1")
            .with_child_value("stddev", "0.2")
            .with_child_value("bias_mean", "0.3")
            .with_child_value("bias_stddev", "0.4")
            .with_child_value("precision", "0.5")
            .into_ptr();

        let mut noise = Noise::new();
        let errors = noise.load(element.clone());
        assert!(errors.is_empty(), "{errors:?}");

        assert_eq!(noise.noise_type(), NoiseType::GaussianQuantized);
        assert_eq!(noise.mean(), 0.1);
        assert_eq!(noise.std_dev(), 0.2);
        assert_eq!(noise.bias_mean(), 0.3);
        assert_eq!(noise.bias_std_dev(), 0.4);
        assert_eq!(noise.precision(), 0.5);
        assert!(std::sync::Arc::ptr_eq(noise.element().unwrap(), &element));
    }

    #[test]
    fn test_load_unknown_type() {
        let element = Element::new("noise")
            .with_attribute("type", "bogus")
            .with_child_value("stddev", "0.25")
            .into_ptr();

        let mut noise = Noise::new();
        let errors = noise.load(element);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementInvalid);
        assert!(!errors[0].is_fatal());
        assert!(errors[0].message.contains("bogus"));

        assert_eq!(noise.noise_type(), NoiseType::None);
        assert_eq!(noise.mean(), 0.0);
        assert_eq!(noise.std_dev(), 0.25);
        assert_eq!(noise.bias_mean(), 0.0);
        assert_eq!(noise.bias_std_dev(), 0.0);
        assert_eq!(noise.precision(), 0.0);
    }

    #[test]
    fn test_load_missing_type() {
        let element = Element::new("noise").with_child_value("mean", "1.5").into_ptr();

        let mut noise = Noise::new();
        noise.set_noise_type(NoiseType::Gaussian);
        let errors = noise.load(element);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementMissing);
        assert_eq!(noise.noise_type(), NoiseType::None);
        assert_eq!(noise.mean(), 1.5);
    }

    #[test]
    fn test_load_wrong_element() {
        let element = Element::new("camera")
            .with_attribute("type", "gaussian")
            .with_child_value("mean", "3.0")
            .into_ptr();

        let mut noise = Noise::new();
        let errors = noise.load(element);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementIncorrectType);
        assert!(errors[0].is_fatal());
        assert_eq!(noise, Noise::new());
        assert_eq!(noise.noise_type(), NoiseType::None);
        assert_eq!(noise.mean(), 0.0);
        assert!(noise.element().is_none());
    }

    #[test]
    fn test_equality_uses_tolerance() {
        let mut a = Noise::new();
        let mut b = Noise::new();
        a.set_std_dev(0.1);
        b.set_std_dev(0.1 + 1e-12);
        assert_eq!(a, b);

        b.set_std_dev(0.2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_ignores_element() {
        let mut a = Noise::new();
        let b = Noise::new();
        let errors = a.load(Element::new("noise").with_attribute("type", "none").into_ptr());
        assert!(errors.is_empty());
        assert!(a.element().is_some());
        assert!(b.element().is_none());
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_type_from_str() {
        assert_eq!("GAUSSIAN".parse::<NoiseType>(), Ok(NoiseType::Gaussian));
        assert_eq!("none".parse::<NoiseType>(), Ok(NoiseType::None));
        assert!("uniform".parse::<NoiseType>().is_err());
        assert_eq!(NoiseType::GaussianQuantized.to_string(), "gaussian_quantized");
    }
}
