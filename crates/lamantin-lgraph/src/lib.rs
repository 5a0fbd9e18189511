#![forbid(unsafe_code)]

//! Layered graph model consumed by the `lamantin` edge router.
//!
//! Upstream phases (layer assignment, crossing minimization, node placement) are expected to
//! have run already: every node belongs to a layer, layers are ordered, and every node carries an
//! absolute position. The router only ever writes bend points and junction points back.

pub mod document;
pub mod error;
pub mod graph;
pub mod model;

pub use document::{EdgeDocument, GraphDocument, LayerDocument, NodeDocument, PortDocument};
pub use error::{Error, Result};
pub use graph::{EdgeId, LEdge, LGraph, LNode, LPort, Layer, LayerId, NodeId, PortId};
pub use model::{Insets, NodeType, Point, PortSide};
