//! `replan-sourcing`: multi-warehouse sourcing arbitration.
//!
//! Landed-cost modelling (FX, duty, shipping), minimum-cost source selection
//! and inter-warehouse transfer scoring.

pub mod arbitrate;
pub mod fx;
pub mod network;
pub mod transfer;

pub use arbitrate::{SourcingDecision, SourcingOption, SourcingQuery, arbitrate, evaluate_option};
pub use fx::{Currency, FxPath, FxResolution, FxTable};
pub use network::{
    ChannelPenalties, SourcingNetwork, StockPosition, TradeRoute, TransferRoute, Warehouse,
};
pub use transfer::{TransferEvaluation, score_transfer};
