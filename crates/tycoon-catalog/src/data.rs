//! Data-driven catalog loading from YAML.
//!
//! Resources are listed by name; buildings reference resources by name.
//! The same structures are embedded in the game configuration so a whole
//! game (rules and content) can live in one file.
//!
//! ```yaml
//! resources: [Copper, Iron]
//! buildings:
//!   - name: Copper Mine
//!     costs:
//!       - { resource: Copper, quantity: 3 }
//!     output: Copper
//!     rate: "0.1"
//! ```

use rust_decimal::Decimal;
use serde::Deserialize;
use tycoon_types::{ResourceId, Term};

use crate::catalog::{BuildingSpec, Catalog, CatalogBuilder, NULL_RESOURCE_NAME};
use crate::error::CatalogError;

/// Top-level catalog data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogData {
    /// Resource kind names, in registration order.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Building definitions, in registration order.
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
}

/// A building definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingData {
    /// Unique name.
    pub name: String,
    /// Ordered cost lines.
    #[serde(default)]
    pub costs: Vec<CostData>,
    /// Output resource name. Defaults to `NullResource`.
    #[serde(default = "default_output")]
    pub output: String,
    /// Units produced per tick.
    #[serde(default)]
    pub rate: Decimal,
    /// Whether players may purchase it.
    #[serde(default = "default_buyable")]
    pub buyable: bool,
}

/// A single cost line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CostData {
    /// Resource name.
    pub resource: String,
    /// Quantity required.
    pub quantity: Decimal,
}

fn default_output() -> String {
    NULL_RESOURCE_NAME.to_owned()
}

const fn default_buyable() -> bool {
    true
}

/// Parse YAML catalog data and build a [`Catalog`].
pub fn load_catalog_yaml(yaml: &str) -> Result<Catalog, CatalogError> {
    let data: CatalogData = serde_yml::from_str(yaml)?;
    build_catalog(&data)
}

/// Build a [`Catalog`] from already-parsed data.
pub fn build_catalog(data: &CatalogData) -> Result<Catalog, CatalogError> {
    let mut builder = CatalogBuilder::new();

    for name in &data.resources {
        builder.register_resource(name)?;
    }

    for building in &data.buildings {
        let output = resolve(&builder, &building.output)?;
        let costs = building
            .costs
            .iter()
            .map(|cost| Ok(Term::new(cost.quantity, resolve(&builder, &cost.resource)?)))
            .collect::<Result<Vec<_>, CatalogError>>()?;
        builder.register_building(BuildingSpec {
            name: building.name.clone(),
            costs,
            output,
            rate: building.rate,
            buyable: building.buyable,
        })?;
    }

    builder.build()
}

fn resolve(builder: &CatalogBuilder, name: &str) -> Result<ResourceId, CatalogError> {
    builder
        .resource_id(name)
        .ok_or_else(|| CatalogError::UnknownResourceName(name.to_owned()))
}
