//! The immutable resource and building catalog.
//!
//! A [`CatalogBuilder`] collects resource kinds and building types, then
//! [`CatalogBuilder::build`] validates every cross-reference and freezes the
//! result into a [`Catalog`]. The catalog has no `&mut self` methods; share
//! it behind an `Arc` and pass it explicitly to whatever needs it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tycoon_types::{BuildingId, ResourceId, Term, within_precision};

use crate::error::CatalogError;
use crate::unit::ProductionUnit;

/// Name of the sentinel resource registered at id 0.
pub const NULL_RESOURCE_NAME: &str = "NullResource";

/// A registered resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    /// Catalog index.
    pub id: ResourceId,
    /// Unique name, e.g. `"Copper"`.
    pub name: String,
}

/// Registration input for a building type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSpec {
    /// Unique name, e.g. `"Copper Mine"`.
    pub name: String,
    /// Ordered cost lines.
    pub costs: Vec<Term>,
    /// Resource produced.
    pub output: ResourceId,
    /// Units produced per tick.
    pub rate: Decimal,
    /// Whether players may purchase it.
    pub buyable: bool,
}

/// A frozen building type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingType {
    /// Catalog index.
    pub id: BuildingId,
    /// Unique name.
    pub name: String,
    /// Short label derived from the name's initials.
    pub display_name: String,
    /// Ordered cost lines.
    pub costs: Vec<Term>,
    /// Resource produced.
    pub output: ResourceId,
    /// Units produced per tick.
    pub rate: Decimal,
    /// Whether players may purchase it. Non-buyable types only exist as
    /// setup fixtures.
    pub buyable: bool,
}

/// Derive a short label from a building name: the first letter of each
/// word, where words split on whitespace, `_`, `-`, and camel-case humps.
///
/// `"Copper Mine"` becomes `"CM"`, `"deepCopperMine"` becomes `"DCM"`.
pub fn abbreviate(name: &str) -> String {
    let mut out = String::new();
    let mut prev: Option<char> = None;
    for c in name.chars() {
        let starts_word = match prev {
            None => c.is_alphanumeric(),
            Some(p) => {
                c.is_alphanumeric()
                    && (p.is_whitespace()
                        || p == '_'
                        || p == '-'
                        || (p.is_lowercase() && c.is_uppercase()))
            }
        };
        if starts_word {
            out.extend(c.to_uppercase());
        }
        prev = Some(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects catalog entries before validation.
#[derive(Debug)]
pub struct CatalogBuilder {
    resources: Vec<ResourceKind>,
    resource_names: BTreeMap<String, ResourceId>,
    buildings: Vec<BuildingSpec>,
    building_names: BTreeMap<String, BuildingId>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Start a builder with only the `NullResource` sentinel registered.
    pub fn new() -> Self {
        let mut resource_names = BTreeMap::new();
        resource_names.insert(NULL_RESOURCE_NAME.to_owned(), ResourceId::NULL);
        Self {
            resources: vec![ResourceKind {
                id: ResourceId::NULL,
                name: NULL_RESOURCE_NAME.to_owned(),
            }],
            resource_names,
            buildings: Vec::new(),
            building_names: BTreeMap::new(),
        }
    }

    /// Register a resource kind. Returns its id.
    pub fn register_resource(&mut self, name: &str) -> Result<ResourceId, CatalogError> {
        if self.resource_names.contains_key(name) {
            return Err(CatalogError::DuplicateName(name.to_owned()));
        }
        let index = u16::try_from(self.resources.len()).map_err(|_err| CatalogError::TooManyEntries)?;
        let id = ResourceId(index);
        self.resources.push(ResourceKind {
            id,
            name: name.to_owned(),
        });
        self.resource_names.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Register a building type. Returns its id. Cross-references are
    /// validated by [`build`](Self::build).
    pub fn register_building(&mut self, spec: BuildingSpec) -> Result<BuildingId, CatalogError> {
        if self.building_names.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateName(spec.name));
        }
        let index = u16::try_from(self.buildings.len()).map_err(|_err| CatalogError::TooManyEntries)?;
        let id = BuildingId(index);
        self.building_names.insert(spec.name.clone(), id);
        self.buildings.push(spec);
        Ok(id)
    }

    /// Look up a registered resource id by name.
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_names.get(name).copied()
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let known = |id: ResourceId| usize::from(id.0) < self.resources.len();

        let mut buildings = Vec::with_capacity(self.buildings.len());
        for (index, spec) in self.buildings.into_iter().enumerate() {
            if !known(spec.output) {
                return Err(CatalogError::InvalidResourceRef {
                    building: spec.name,
                    resource: spec.output,
                });
            }
            if spec.rate < Decimal::ZERO {
                return Err(CatalogError::NegativeRate {
                    building: spec.name,
                    rate: spec.rate,
                });
            }
            if spec.output.is_null() && !spec.rate.is_zero() {
                return Err(CatalogError::NullOutputRate { building: spec.name });
            }
            if !within_precision(spec.rate) {
                return Err(CatalogError::ExcessPrecision {
                    building: spec.name,
                    quantity: spec.rate,
                });
            }
            for cost in &spec.costs {
                if !known(cost.resource) {
                    return Err(CatalogError::InvalidResourceRef {
                        building: spec.name,
                        resource: cost.resource,
                    });
                }
                if cost.resource.is_null() {
                    return Err(CatalogError::NullCost { building: spec.name });
                }
                if cost.quantity <= Decimal::ZERO {
                    return Err(CatalogError::NonPositiveCost {
                        building: spec.name,
                        quantity: cost.quantity,
                    });
                }
                if !within_precision(cost.quantity) {
                    return Err(CatalogError::ExcessPrecision {
                        building: spec.name,
                        quantity: cost.quantity,
                    });
                }
            }
            let id = BuildingId(u16::try_from(index).map_err(|_err| CatalogError::TooManyEntries)?);
            buildings.push(BuildingType {
                id,
                display_name: abbreviate(&spec.name),
                name: spec.name,
                costs: spec.costs,
                output: spec.output,
                rate: spec.rate,
                buyable: spec.buyable,
            });
        }

        debug!(
            resources = self.resources.len(),
            buildings = buildings.len(),
            "catalog frozen"
        );

        Ok(Catalog {
            resources: self.resources,
            resource_names: self.resource_names,
            buildings,
            building_names: self.building_names,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog of resource kinds and building types.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: Vec<ResourceKind>,
    resource_names: BTreeMap<String, ResourceId>,
    buildings: Vec<BuildingType>,
    building_names: BTreeMap<String, BuildingId>,
}

impl Catalog {
    /// Fetch a building type.
    pub fn lookup(&self, id: BuildingId) -> Result<&BuildingType, CatalogError> {
        self.buildings
            .get(usize::from(id.0))
            .ok_or(CatalogError::UnknownBuildingType(id))
    }

    /// Fetch a building type by name.
    pub fn lookup_by_name(&self, name: &str) -> Result<&BuildingType, CatalogError> {
        let id = self
            .building_names
            .get(name)
            .ok_or_else(|| CatalogError::UnknownBuildingName(name.to_owned()))?;
        self.lookup(*id)
    }

    /// Create a fresh production unit of the given type.
    pub fn instantiate(&self, id: BuildingId) -> Result<ProductionUnit, CatalogError> {
        let building = self.lookup(id)?;
        Ok(ProductionUnit::new(building.id, building.output, building.rate))
    }

    /// Fetch a resource kind.
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceKind> {
        self.resources.get(usize::from(id.0))
    }

    /// Fetch a resource kind by name.
    pub fn resource_by_name(&self, name: &str) -> Result<&ResourceKind, CatalogError> {
        self.resource_names
            .get(name)
            .and_then(|id| self.resource(*id))
            .ok_or_else(|| CatalogError::UnknownResourceName(name.to_owned()))
    }

    /// Display name of a resource, or `"?"` for an unknown id.
    pub fn resource_name(&self, id: ResourceId) -> &str {
        self.resource(id).map_or("?", |kind| kind.name.as_str())
    }

    /// All resource kinds in registration order, sentinel first.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceKind> {
        self.resources.iter()
    }

    /// All resource ids, sentinel first.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().map(|kind| kind.id)
    }

    /// All building types in registration order.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingType> {
        self.buildings.iter()
    }

    /// Building types players may purchase, in registration order.
    pub fn buildable(&self) -> impl Iterator<Item = &BuildingType> {
        self.buildings.iter().filter(|b| b.buyable)
    }

    /// Number of resource kinds, sentinel included.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of building types.
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}
