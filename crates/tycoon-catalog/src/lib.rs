//! Resource kinds, building catalog, and production units.
//!
//! The catalog is static configuration: built once at startup, validated,
//! then frozen. Everything downstream addresses resources and buildings by
//! their compact index ids.
//!
//! # Modules
//!
//! - [`catalog`] -- [`CatalogBuilder`] and the immutable [`Catalog`]
//! - [`data`] -- YAML catalog loading
//! - [`standard`] -- the built-in two-ore catalog
//! - [`unit`] -- [`ProductionUnit`], a purchased building instance
//! - [`error`] -- [`CatalogError`]

pub mod catalog;
pub mod data;
pub mod error;
pub mod standard;
pub mod unit;

pub use catalog::{
    BuildingSpec, BuildingType, Catalog, CatalogBuilder, NULL_RESOURCE_NAME, ResourceKind,
    abbreviate,
};
pub use data::{BuildingData, CatalogData, CostData, build_catalog, load_catalog_yaml};
pub use error::CatalogError;
pub use standard::standard_catalog;
pub use unit::ProductionUnit;
