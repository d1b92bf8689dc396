//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ProductName`] - Validated data product name
//! - [`Semver`] - Validated `MAJOR.MINOR.PATCH` version string
//! - [`Confidence`] - Lineage confidence score in the closed unit interval
//! - [`UtcTimestamp`] - UTC timestamp with RFC3339 serialization
//! - [`ProductStatus`] / [`LineageType`] - Closed enums
//! - [`Page`] - Offset/limit pagination window
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the catalog and graph never have to
//! re-check field formats.
//!
//! # Examples
//!
//! ```
//! use meshline::core::types::{Confidence, ProductName, Semver};
//!
//! let name = ProductName::new("sales_orders").unwrap();
//! let version = Semver::new("2.1.0").unwrap();
//! let confidence = Confidence::new(0.95).unwrap();
//!
//! assert!(ProductName::new("has space").is_err());
//! assert!(Semver::new("2.1").is_err());
//! assert!(Confidence::new(1.5).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("invalid product name: {0}")]
    InvalidProductName(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid confidence {0}: must be within [0.0, 1.0]")]
    InvalidConfidence(f64),

    #[error("invalid status '{0}': must be one of active, deprecated, inactive")]
    InvalidStatus(String),

    #[error("invalid lineage type '{0}': must be one of direct, derived, aggregated")]
    InvalidLineageType(String),
}

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 100;

/// A validated data product name.
///
/// Product names identify products for their whole lifetime and are the
/// node keys of the lineage graph:
/// - Cannot be empty
/// - At most [`MAX_NAME_LEN`] characters
/// - ASCII alphanumerics, `_` and `-` only
///
/// # Example
///
/// ```
/// use meshline::core::types::ProductName;
///
/// let name = ProductName::new("customer-events_v2").unwrap();
/// assert_eq!(name.as_str(), "customer-events_v2");
///
/// assert!(ProductName::new("").is_err());
/// assert!(ProductName::new("no spaces").is_err());
/// assert!(ProductName::new("no/slashes").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName(String);

impl ProductName {
    /// Create a new validated product name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidProductName` if the name violates the
    /// naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidProductName(
                "product name cannot be empty".into(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(TypeError::InvalidProductName(format!(
                "product name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        for c in name.chars() {
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(TypeError::InvalidProductName(format!(
                    "product name cannot contain '{c}'"
                )));
            }
        }
        Ok(())
    }

    /// Get the product name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ProductName> for String {
    fn from(name: ProductName) -> Self {
        name.0
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ProductName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for ProductName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated semantic version string (`MAJOR.MINOR.PATCH`).
///
/// The version is stored verbatim; only its shape is validated. The
/// registry never orders or compares versions.
///
/// # Example
///
/// ```
/// use meshline::core::types::Semver;
///
/// let v = Semver::new("1.0.0").unwrap();
/// assert_eq!(v.as_str(), "1.0.0");
///
/// assert!(Semver::new("1.0").is_err());
/// assert!(Semver::new("1.0.0-rc1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Semver(String);

impl Semver {
    /// Create a new validated version string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersion` unless the string is three
    /// dot-separated decimal components.
    pub fn new(version: impl Into<String>) -> Result<Self, TypeError> {
        let version = version.into();
        Self::validate(&version)?;
        Ok(Self(version))
    }

    fn validate(version: &str) -> Result<(), TypeError> {
        let components: Vec<&str> = version.split('.').collect();
        if components.len() != 3 {
            return Err(TypeError::InvalidVersion(format!(
                "expected MAJOR.MINOR.PATCH, got '{version}'"
            )));
        }
        for component in components {
            if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
                return Err(TypeError::InvalidVersion(format!(
                    "expected MAJOR.MINOR.PATCH, got '{version}'"
                )));
            }
        }
        Ok(())
    }

    /// Get the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Semver {
    /// The initial version for newly registered products.
    fn default() -> Self {
        Self("1.0.0".to_string())
    }
}

impl TryFrom<String> for Semver {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Semver> for String {
    fn from(version: Semver) -> Self {
        version.0
    }
}

impl std::str::FromStr for Semver {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Semver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lineage confidence score in the closed interval `[0.0, 1.0]`.
///
/// The boundaries are inclusive: `0.0` and `1.0` are both valid.
/// NaN is rejected.
///
/// # Example
///
/// ```
/// use meshline::core::types::Confidence;
///
/// assert!(Confidence::new(0.0).is_ok());
/// assert!(Confidence::new(1.0).is_ok());
/// assert!(Confidence::new(1.0000001).is_err());
/// assert!(Confidence::new(-0.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new validated confidence score.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidConfidence` if the value is outside
    /// `[0.0, 1.0]` or is NaN.
    pub fn new(value: f64) -> Result<Self, TypeError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(TypeError::InvalidConfidence(value));
        }
        Ok(Self(value))
    }

    /// Get the score as an `f64`.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Confidence {
    /// Full confidence, the default for declared lineage.
    fn default() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = TypeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl std::str::FromStr for Confidence {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .parse()
            .map_err(|_| TypeError::InvalidConfidence(f64::NAN))?;
        Self::new(value)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a data product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// The product is live and consumable.
    #[default]
    Active,
    /// The product still exists but consumers should migrate away.
    Deprecated,
    /// The product is retired.
    Inactive,
}

impl ProductStatus {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "deprecated" => Ok(Self::Deprecated),
            "inactive" => Ok(Self::Inactive),
            other => Err(TypeError::InvalidStatus(other.to_string())),
        }
    }
}

/// Kind of relationship a lineage edge records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LineageType {
    /// Target is a direct copy or pass-through of the source.
    #[default]
    Direct,
    /// Target is computed from the source by a transformation.
    Derived,
    /// Target aggregates the source with other inputs.
    Aggregated,
}

impl LineageType {
    /// All lineage types, in serialization order.
    pub const ALL: [LineageType; 3] = [Self::Direct, Self::Derived, Self::Aggregated];

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Derived => "derived",
            Self::Aggregated => "aggregated",
        }
    }
}

impl std::fmt::Display for LineageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LineageType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "derived" => Ok(Self::Derived),
            "aggregated" => Ok(Self::Aggregated),
            other => Err(TypeError::InvalidLineageType(other.to_string())),
        }
    }
}

/// A UTC timestamp with RFC3339 serialization.
///
/// # Example
///
/// ```
/// use meshline::core::types::UtcTimestamp;
///
/// let earlier = UtcTimestamp::now();
/// let later = UtcTimestamp::now();
/// assert!(later >= earlier);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }

    /// The next representable instant after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + chrono::Duration::nanoseconds(1))
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// An offset/limit pagination window.
///
/// The limit is a request, not a guarantee: callers clamp it to the
/// configured maximum page size before handing it to the catalog or graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of matching entries to skip.
    pub offset: usize,
    /// Maximum number of entries to return.
    pub limit: usize,
}

impl Page {
    /// Create a page window.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Clamp the limit to `max` (the configured maximum page size).
    pub fn clamped(self, max: usize) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max),
        }
    }

    /// Apply the window to an iterator of references.
    pub fn apply<'a, T, I>(self, iter: I) -> Vec<&'a T>
    where
        I: Iterator<Item = &'a T>,
    {
        iter.skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Page {
    /// The default window used when the caller supplies no pagination.
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod product_name {
        use super::*;

        #[test]
        fn accepts_alphanumerics_underscores_hyphens() {
            for valid in ["orders", "sales_orders", "customer-360", "A1"] {
                assert!(ProductName::new(valid).is_ok(), "{valid} should be valid");
            }
        }

        #[test]
        fn rejects_empty() {
            assert!(ProductName::new("").is_err());
        }

        #[test]
        fn rejects_invalid_characters() {
            for invalid in ["has space", "a/b", "a.b", "naïve", "a:b"] {
                assert!(
                    ProductName::new(invalid).is_err(),
                    "{invalid} should be rejected"
                );
            }
        }

        #[test]
        fn rejects_overlong_names() {
            let name = "x".repeat(MAX_NAME_LEN + 1);
            assert!(ProductName::new(name).is_err());

            let name = "x".repeat(MAX_NAME_LEN);
            assert!(ProductName::new(name).is_ok());
        }

        #[test]
        fn serde_roundtrip() {
            let name = ProductName::new("orders").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, "\"orders\"");
            let parsed: ProductName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, name);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<ProductName, _> = serde_json::from_str("\"not valid\"");
            assert!(result.is_err());
        }
    }

    mod semver {
        use super::*;

        #[test]
        fn accepts_three_numeric_components() {
            for valid in ["0.0.0", "1.0.0", "12.34.56"] {
                assert!(Semver::new(valid).is_ok(), "{valid} should be valid");
            }
        }

        #[test]
        fn rejects_malformed_versions() {
            for invalid in ["1", "1.0", "1.0.0.0", "1.0.x", "1..0", "v1.0.0", ""] {
                assert!(Semver::new(invalid).is_err(), "{invalid} should be rejected");
            }
        }

        #[test]
        fn default_is_one_zero_zero() {
            assert_eq!(Semver::default().as_str(), "1.0.0");
        }
    }

    mod confidence {
        use super::*;

        #[test]
        fn boundaries_are_inclusive() {
            assert!(Confidence::new(0.0).is_ok());
            assert!(Confidence::new(1.0).is_ok());
        }

        #[test]
        fn out_of_range_rejected() {
            assert_eq!(
                Confidence::new(1.5),
                Err(TypeError::InvalidConfidence(1.5))
            );
            assert!(Confidence::new(-0.01).is_err());
        }

        #[test]
        fn nan_rejected() {
            assert!(Confidence::new(f64::NAN).is_err());
        }

        #[test]
        fn default_is_full_confidence() {
            assert_eq!(Confidence::default().value(), 1.0);
        }

        #[test]
        fn serde_rejects_out_of_range() {
            let result: Result<Confidence, _> = serde_json::from_str("2.0");
            assert!(result.is_err());
        }
    }

    mod enums {
        use super::*;

        #[test]
        fn status_serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&ProductStatus::Deprecated).unwrap(),
                "\"deprecated\""
            );
        }

        #[test]
        fn lineage_type_serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&LineageType::Aggregated).unwrap(),
                "\"aggregated\""
            );
        }

        #[test]
        fn defaults() {
            assert_eq!(ProductStatus::default(), ProductStatus::Active);
            assert_eq!(LineageType::default(), LineageType::Direct);
        }

        #[test]
        fn parse_matches_serialized_form() {
            assert_eq!(
                "deprecated".parse::<ProductStatus>().unwrap(),
                ProductStatus::Deprecated
            );
            assert_eq!(
                "aggregated".parse::<LineageType>().unwrap(),
                LineageType::Aggregated
            );
            assert!("Active".parse::<ProductStatus>().is_err());
            assert!("indirect".parse::<LineageType>().is_err());
        }
    }

    mod timestamp {
        use super::*;

        #[test]
        fn next_is_strictly_later() {
            let t = UtcTimestamp::now();
            assert!(t.next() > t);
            assert!(t.next().next() > t.next());
        }
    }

    mod page {
        use super::*;

        #[test]
        fn clamps_limit() {
            let page = Page::new(0, 5000).clamped(1000);
            assert_eq!(page.limit, 1000);

            let page = Page::new(0, 10).clamped(1000);
            assert_eq!(page.limit, 10);
        }

        #[test]
        fn applies_offset_then_limit() {
            let items: Vec<u32> = (0..10).collect();
            let window = Page::new(3, 4).apply(items.iter());
            assert_eq!(window, vec![&3, &4, &5, &6]);
        }

        #[test]
        fn offset_past_end_is_empty() {
            let items: Vec<u32> = (0..3).collect();
            let window = Page::new(10, 4).apply(items.iter());
            assert!(window.is_empty());
        }
    }
}
