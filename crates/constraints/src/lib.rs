//! `replan-constraints`: supplier order constraints and budget admission
//! control.

pub mod admission;
pub mod budget;
pub mod rounding;

pub use admission::{
    AdmissionCandidate, AdmissionOutcome, AdmissionResult, DeferredOrder, run_admission,
};
pub use budget::ConstraintBudget;
pub use rounding::{RoundedQuantity, apply_order_constraints};
