//! core::product
//!
//! Data product records and their creation/patch inputs.
//!
//! # Architecture
//!
//! A [`DataProduct`] is the canonical catalog record. Callers never build
//! one directly: they submit a [`ProductDraft`], and the catalog stamps
//! `created_at`/`updated_at` at insertion time. Updates are expressed as a
//! [`ProductPatch`] with partial-patch semantics; omitted fields keep
//! their prior value and the name is never patchable.
//!
//! # Opaque payloads
//!
//! The `schema` field is an opaque JSON mapping. The registry stores and
//! returns it verbatim and never interprets its contents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::types::{ProductName, ProductStatus, Semver, UtcTimestamp};

/// A registered data product.
///
/// `name` is the immutable identity key. Timestamps are engine-set and
/// never client-supplied; `updated_at >= created_at` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProduct {
    /// Unique, immutable identity key.
    pub name: ProductName,

    /// Free-form business-domain tag.
    pub domain: String,

    /// Owning contact.
    pub owner: String,

    /// Human-readable description.
    pub description: String,

    /// Opaque schema payload, stored verbatim.
    pub schema: Map<String, Value>,

    /// Lifecycle status.
    pub status: ProductStatus,

    /// Declared version.
    pub version: Semver,

    /// Normalized tag set.
    pub tags: BTreeSet<String>,

    /// Set when the product is first registered.
    pub created_at: UtcTimestamp,

    /// Bumped on every accepted update.
    pub updated_at: UtcTimestamp,
}

/// Input for registering a new product.
///
/// The catalog turns a draft into a [`DataProduct`] by normalizing tags
/// and stamping both timestamps with the same instant.
///
/// # Example
///
/// ```
/// use meshline::core::product::ProductDraft;
/// use meshline::core::types::ProductName;
///
/// let draft = ProductDraft::new(
///     ProductName::new("orders").unwrap(),
///     "sales",
///     "sales-team@example.com",
///     "Raw sales orders",
/// )
/// .with_tags(["Finance", "pii"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: ProductName,
    pub domain: String,
    pub owner: String,
    pub description: String,
    #[serde(default)]
    pub schema: Map<String, Value>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub version: Semver,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProductDraft {
    /// Create a draft with default status, version, and empty payloads.
    pub fn new(
        name: ProductName,
        domain: impl Into<String>,
        owner: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name,
            domain: domain.into(),
            owner: owner.into(),
            description: description.into(),
            schema: Map::new(),
            status: ProductStatus::default(),
            version: Semver::default(),
            tags: Vec::new(),
        }
    }

    /// Attach a schema payload.
    pub fn with_schema(mut self, schema: Map<String, Value>) -> Self {
        self.schema = schema;
        self
    }

    /// Set the declared version.
    pub fn with_version(mut self, version: Semver) -> Self {
        self.version = version;
        self
    }

    /// Set the lifecycle status.
    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach tags (normalized at materialization time).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Materialize the draft into a product record at `now`.
    pub(crate) fn into_product(self, now: UtcTimestamp) -> DataProduct {
        DataProduct {
            name: self.name,
            domain: self.domain,
            owner: self.owner,
            description: self.description,
            schema: self.schema,
            status: self.status,
            version: self.version,
            tags: normalize_tags(self.tags),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update to an existing product.
///
/// Every field is optional; `None` means "keep the current value".
/// There is deliberately no `name` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub domain: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub schema: Option<Map<String, Value>>,
    pub status: Option<ProductStatus>,
    pub version: Option<Semver>,
    pub tags: Option<Vec<String>>,
}

impl ProductPatch {
    /// True if the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a product in place.
    ///
    /// Does not touch `updated_at`; the catalog stamps that after a
    /// successful apply so the timestamp reflects acceptance time.
    pub(crate) fn apply_to(self, product: &mut DataProduct) {
        if let Some(domain) = self.domain {
            product.domain = domain;
        }
        if let Some(owner) = self.owner {
            product.owner = owner;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(schema) = self.schema {
            product.schema = schema;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(version) = self.version {
            product.version = version;
        }
        if let Some(tags) = self.tags {
            product.tags = normalize_tags(tags);
        }
    }
}

/// Normalize a tag list into the stored set form.
///
/// Tags are trimmed and lowercased; empty tags are dropped and
/// duplicates collapse.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> ProductDraft {
        ProductDraft::new(
            ProductName::new(name).unwrap(),
            "sales",
            "sales-team@example.com",
            "Raw sales orders",
        )
    }

    #[test]
    fn draft_materializes_with_equal_timestamps() {
        let product = draft("orders").into_product(UtcTimestamp::now());

        assert_eq!(product.created_at, product.updated_at);
        assert_eq!(product.version.as_str(), "1.0.0");
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags(["  Finance ", "PII", "pii", "", "  "]);
        let expected: BTreeSet<String> = ["finance", "pii"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let mut product = draft("orders").into_product(UtcTimestamp::now());

        let patch = ProductPatch {
            description: Some("Curated sales orders".into()),
            status: Some(ProductStatus::Deprecated),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut product);

        assert_eq!(product.description, "Curated sales orders");
        assert_eq!(product.status, ProductStatus::Deprecated);
        // Untouched fields keep their prior value.
        assert_eq!(product.domain, "sales");
        assert_eq!(product.owner, "sales-team@example.com");
    }

    #[test]
    fn patch_tags_replace_and_normalize() {
        let mut product = draft("orders").into_product(UtcTimestamp::now());

        let patch = ProductPatch {
            tags: Some(vec!["Gold ".into(), "gold".into(), "daily".into()]),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut product);

        assert_eq!(product.tags.len(), 2);
        assert!(product.tags.contains("gold"));
        assert!(product.tags.contains("daily"));
    }

    #[test]
    fn empty_patch_detection() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            owner: Some("new-owner".into()),
            ..ProductPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn product_serde_roundtrip_preserves_schema_payload() {
        let mut schema = Map::new();
        schema.insert("order_id".into(), Value::String("int64".into()));
        schema.insert(
            "nested".into(),
            serde_json::json!({ "amount": "decimal", "currency": "string" }),
        );

        let product = draft("orders")
            .with_schema(schema.clone())
            .into_product(UtcTimestamp::now());

        let json = serde_json::to_string(&product).unwrap();
        let parsed: DataProduct = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, product);
        assert_eq!(parsed.schema, schema);
    }
}
