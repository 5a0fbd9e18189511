//! Routing options.
//!
//! All structs deserialize with per-field defaults so a partial JSON object is enough to override
//! a single value.

use crate::direction::RoutingDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundlingStrategy {
    #[default]
    None,
    /// Edges carrying the same user-assigned bundle id share a trunk.
    Manual,
    /// Edges between the same pair of real nodes share a trunk.
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundlingStyle {
    /// Members are drawn on top of each other.
    SingleLine,
    #[default]
    Bundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundlingOptions {
    pub strategy: BundlingStrategy,
    pub style: BundlingStyle,
    pub bundle_spacing: f64,
}

impl Default for BundlingOptions {
    fn default() -> Self {
        Self {
            strategy: BundlingStrategy::None,
            style: BundlingStyle::Bundle,
            bundle_spacing: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingOptions {
    pub direction: RoutingDirection,
    /// Distance between two parallel vertical segments.
    pub edge_edge_spacing: f64,
    /// Distance between a vertical segment and the closest node border.
    pub edge_node_spacing: f64,
    pub bundling: BundlingOptions,
    pub random_seed: u64,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            direction: RoutingDirection::WestToEast,
            edge_edge_spacing: 10.0,
            edge_node_spacing: 10.0,
            bundling: BundlingOptions::default(),
            random_seed: 1,
        }
    }
}
