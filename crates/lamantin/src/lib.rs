#![forbid(unsafe_code)]

//! Orthogonal edge routing between the layers of a layered graph drawing.
//!
//! Edges crossing a layer boundary are grouped into hypernodes, ordered to minimise crossings
//! and assigned vertical slots. Optional edge bundling merges parallel edges into a shared trunk.
//! The entry point is [`route_graph`].

pub mod bundles;
pub mod chain;
pub mod compaction;
pub mod cycle_breaking;
pub mod debug;
pub mod direction;
pub mod error;
pub mod hypernode;
pub mod options;
pub mod random;
pub mod ranking;
pub mod report;
pub mod router;
pub mod routing;
pub mod segments;

pub use bundles::{BundleContext, BundleHandler};
pub use direction::RoutingDirection;
pub use error::{Error, Result};
pub use hypernode::{HyperNode, HyperNodeGraph, HyperNodeId};
pub use options::{BundlingOptions, BundlingStrategy, BundlingStyle, RoutingOptions};
pub use random::{RandomSource, XorShift64Star};
pub use report::{RoutingIssue, RoutingReport, Severity};
pub use router::route_graph;
pub use routing::OrthogonalRoutingGenerator;
