// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query complexity classification and model routing for Token-Diet.
//!
//! This crate provides:
//! - [`QueryClassifier`]: length threshold plus keyword heuristic (no model call)
//! - [`ModelRouter`]: maps the classified tier to the economy or premium model
//!
//! Routing is a pure function of the prompt text and the routing config, so
//! the same prompt always lands on the same model.

pub mod classifier;
pub mod router;

pub use classifier::{ClassificationResult, ComplexityTier, QueryClassifier};
pub use router::{ModelRouter, RoutingDecision};
