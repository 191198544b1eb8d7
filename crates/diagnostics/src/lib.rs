//! `replan-diagnostics`: read-only explanations for decision records.

pub mod explain;

pub use explain::{
    ApprovalTier, ConstraintImpact, DecisionExplanation, FormulaBreakdown, RiskFactor,
    SensitivityEntry, SensitivityInput, SensitivityTable, Severity, WhatIfScenario, approval_tier,
    explain,
};
