//! `replan-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! errors, strongly-typed identifiers, SKU master data and the append-only
//! decision record shared by every planning component.

pub mod decision;
pub mod error;
pub mod id;
pub mod sku;

pub use decision::{AbcClass, AdjustmentKind, ConstraintAdjustment, DecisionRecord, RiskFlag};
pub use error::{DomainError, DomainResult};
pub use id::{JobId, PlanId, RegionId, SkuId, WarehouseId};
pub use sku::{ChannelType, DemandHistory, SkuProfile};
