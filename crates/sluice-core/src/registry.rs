// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The tag registry: the static mapping from logical tag names to source
//! addresses and display metadata.
//!
//! The registry is built once at startup from configuration and never
//! mutated afterwards, so it can be shared freely between the poller and the
//! HTTP handlers without any synchronization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RegistryError;
use crate::types::TagName;

// =============================================================================
// TagSpec
// =============================================================================

/// A single tag definition.
///
/// # Examples
///
/// ```
/// use sluice_core::registry::TagSpec;
///
/// let spec = TagSpec::new("FlowTransmitter", "ns=2;s=Flow.PV")
///     .with_unit("L/min")
///     .with_scale(0.1);
/// assert_eq!(spec.apply_hints(125.0), 12.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSpec {
    /// Unique logical name; cache key and JSON field key.
    pub name: TagName,

    /// Opaque source-system address (an OPC UA node id for this product).
    pub address: String,

    /// Display unit, passed through to consumers unmodified.
    #[serde(default)]
    pub unit: String,

    /// Optional multiplier applied to the raw reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    /// Optional number of decimal places the published value is rounded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

impl TagSpec {
    /// Creates a new tag spec with no unit or formatting hints.
    pub fn new(name: impl Into<TagName>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            unit: String::new(),
            scale: None,
            decimals: None,
        }
    }

    /// Sets the display unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the scale multiplier.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the rounding precision.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Applies this spec's scaling and rounding hints to a raw reading.
    pub fn apply_hints(&self, raw: f64) -> f64 {
        let scaled = match self.scale {
            Some(scale) => raw * scale,
            None => raw,
        };

        match self.decimals {
            Some(decimals) => {
                let factor = 10f64.powi(decimals as i32);
                (scaled * factor).round() / factor
            }
            None => scaled,
        }
    }
}

// =============================================================================
// TagRegistry
// =============================================================================

/// Immutable collection of tag specs, keyed by name.
///
/// Iteration preserves the order tags were declared in the configuration.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    specs: Vec<TagSpec>,
    by_name: HashMap<TagName, usize>,
}

impl TagRegistry {
    /// Builds a registry from tag entries, validating as it goes.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if an entry has an empty name or address,
    /// or if two entries share a name.
    pub fn from_entries(
        entries: impl IntoIterator<Item = TagSpec>,
    ) -> Result<Self, RegistryError> {
        let mut specs = Vec::new();
        let mut by_name = HashMap::new();

        for (index, spec) in entries.into_iter().enumerate() {
            if spec.name.as_str().is_empty() {
                return Err(RegistryError::EmptyName { index });
            }
            if spec.address.is_empty() {
                return Err(RegistryError::empty_address(spec.name.as_str()));
            }
            if by_name.contains_key(&spec.name) {
                return Err(RegistryError::duplicate(spec.name.as_str()));
            }

            by_name.insert(spec.name.clone(), specs.len());
            specs.push(spec);
        }

        Ok(Self { specs, by_name })
    }

    /// Creates an empty registry.
    ///
    /// An empty registry is valid: the poller idles and the snapshot endpoint
    /// serves `{}`.
    pub fn empty() -> Self {
        Self {
            specs: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Looks up a tag by name.
    pub fn get(&self, name: &TagName) -> Option<&TagSpec> {
        self.by_name.get(name).map(|&i| &self.specs[i])
    }

    /// Looks up a tag by its source address.
    pub fn get_by_address(&self, address: &str) -> Option<&TagSpec> {
        self.specs.iter().find(|s| s.address == address)
    }

    /// Returns `true` if a tag with this name exists.
    pub fn contains(&self, name: &TagName) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates over all tag specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TagSpec> {
        self.specs.iter()
    }

    /// Returns the addresses of every registered tag, in declaration order.
    ///
    /// This is the read set the poller hands to the source client each cycle.
    pub fn addresses(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.address.clone()).collect()
    }

    /// Returns the number of registered tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if the registry has no tags.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<TagSpec> {
        vec![
            TagSpec::new("FlowTransmitter", "ns=2;s=Flow.PV").with_unit("L/min"),
            TagSpec::new("Pressure", "ns=2;s=Press.PV").with_unit("bar"),
        ]
    }

    #[test]
    fn test_registry_lookup() {
        let registry = TagRegistry::from_entries(sample_entries()).unwrap();

        assert_eq!(registry.len(), 2);
        let spec = registry.get(&TagName::new("Pressure")).unwrap();
        assert_eq!(spec.address, "ns=2;s=Press.PV");
        assert_eq!(spec.unit, "bar");

        assert!(registry.get(&TagName::new("Missing")).is_none());
    }

    #[test]
    fn test_registry_preserves_declaration_order() {
        let registry = TagRegistry::from_entries(sample_entries()).unwrap();
        let addresses = registry.addresses();
        assert_eq!(addresses, vec!["ns=2;s=Flow.PV", "ns=2;s=Press.PV"]);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut entries = sample_entries();
        entries.push(TagSpec::new("Pressure", "ns=2;s=Other"));

        let err = TagRegistry::from_entries(entries).unwrap_err();
        assert_eq!(err, RegistryError::duplicate("Pressure"));
    }

    #[test]
    fn test_registry_rejects_empty_name() {
        let entries = vec![TagSpec::new("", "ns=2;i=1")];
        let err = TagRegistry::from_entries(entries).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName { index: 0 });
    }

    #[test]
    fn test_registry_rejects_empty_address() {
        let entries = vec![TagSpec::new("Flow", "")];
        let err = TagRegistry::from_entries(entries).unwrap_err();
        assert_eq!(err, RegistryError::empty_address("Flow"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = TagRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.addresses().is_empty());
    }

    #[test]
    fn test_lookup_by_address() {
        let registry = TagRegistry::from_entries(sample_entries()).unwrap();
        let spec = registry.get_by_address("ns=2;s=Flow.PV").unwrap();
        assert_eq!(spec.name.as_str(), "FlowTransmitter");
    }

    #[test]
    fn test_apply_hints() {
        let spec = TagSpec::new("T", "a").with_scale(0.5).with_decimals(1);
        assert_eq!(spec.apply_hints(25.26), 12.6);

        let plain = TagSpec::new("T", "a");
        assert_eq!(plain.apply_hints(25.26), 25.26);
    }
}
