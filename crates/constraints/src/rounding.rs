//! MOQ and lot-size rounding.
//!
//! Application order is fixed: MOQ strictly before lot size. Lot rounding
//! always rounds *up*, so it can never take a quantity back below the MOQ.

use replan_core::{AdjustmentKind, ConstraintAdjustment};

/// Result of applying supplier order constraints to a raw quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundedQuantity {
    pub quantity: f64,
    /// Adjustments in application order; empty when the input was already
    /// compliant (rounding is idempotent).
    pub adjustments: Vec<ConstraintAdjustment>,
}

/// Round a recommended quantity up to supplier MOQ and lot size.
///
/// A zero quantity means "no order" and passes through untouched. `unit_cost`
/// is only used to price the cost impact of each adjustment.
pub fn apply_order_constraints(
    quantity: f64,
    moq: Option<f64>,
    lot_size: Option<f64>,
    unit_cost: f64,
) -> RoundedQuantity {
    let mut qty = quantity;
    let mut adjustments = Vec::new();

    if qty <= 0.0 {
        return RoundedQuantity {
            quantity: 0.0,
            adjustments,
        };
    }

    if let Some(moq) = moq.filter(|m| *m > 0.0)
        && qty < moq
    {
        adjustments.push(ConstraintAdjustment {
            kind: AdjustmentKind::MoqConstraint,
            quantity_before: qty,
            quantity_after: moq,
            cost_impact: (moq - qty) * unit_cost,
            note: format!("raised to supplier minimum order quantity {moq}"),
        });
        qty = moq;
    }

    if let Some(lot) = lot_size.filter(|l| *l > 0.0) {
        // Tolerate float noise on already-exact multiples so rounding stays
        // idempotent.
        let ratio = qty / lot;
        let lots = if (ratio - ratio.round()).abs() < 1e-9 {
            ratio.round()
        } else {
            ratio.ceil()
        };
        let rounded = lots * lot;
        if rounded > qty {
            adjustments.push(ConstraintAdjustment {
                kind: AdjustmentKind::LotSizeConstraint,
                quantity_before: qty,
                quantity_after: rounded,
                cost_impact: (rounded - qty) * unit_cost,
                note: format!("rounded up to lot size {lot}"),
            });
            qty = rounded;
        }
    }

    RoundedQuantity {
        quantity: qty,
        adjustments,
    }
}
