// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pricing and cost estimation for the Token-Diet pipeline.
//!
//! This crate provides:
//! - **Price table**: per-model input prices in USD per million tokens
//! - **Cost calculation**: token count to estimated USD cost
//! - **Savings**: the difference between sending the full context to the
//!   premium model and sending the pruned context to the economy model

pub mod pricing;

pub use pricing::{PriceTable, money_saved};
