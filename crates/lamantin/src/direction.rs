//! Routing direction strategies.
//!
//! A direction decides which coordinate hypernodes sweep along, which port sides feed them, and
//! how a trunk coordinate plus a sweep coordinate become a bend point.

use lamantin_lgraph::{LGraph, LayerId, Point, PortId, PortSide};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingDirection {
    /// Layers left to right, trunks are vertical.
    #[default]
    WestToEast,
    /// Layers top to bottom, trunks are horizontal.
    NorthToSouth,
    /// Layers bottom to top, trunks are horizontal.
    SouthToNorth,
}

impl RoutingDirection {
    pub fn source_side(self) -> PortSide {
        match self {
            Self::WestToEast => PortSide::East,
            Self::NorthToSouth => PortSide::South,
            Self::SouthToNorth => PortSide::North,
        }
    }

    pub fn target_side(self) -> PortSide {
        match self {
            Self::WestToEast => PortSide::West,
            Self::NorthToSouth => PortSide::North,
            Self::SouthToNorth => PortSide::South,
        }
    }

    /// Coordinate a hypernode's span is measured along.
    pub fn sweep(self, p: Point) -> f64 {
        match self {
            Self::WestToEast => p.y,
            Self::NorthToSouth | Self::SouthToNorth => p.x,
        }
    }

    /// Coordinate the trunk is placed at.
    pub fn trunk(self, p: Point) -> f64 {
        match self {
            Self::WestToEast => p.x,
            Self::NorthToSouth | Self::SouthToNorth => p.y,
        }
    }

    pub fn port_position_on_hyper_node(self, g: &LGraph, port: PortId) -> f64 {
        self.sweep(g.absolute_anchor(port))
    }

    pub fn bend_point(self, trunk: f64, sweep: f64) -> Point {
        match self {
            Self::WestToEast => Point::new(trunk, sweep),
            Self::NorthToSouth | Self::SouthToNorth => Point::new(sweep, trunk),
        }
    }

    /// Trunk coordinate of slot `rank` when slots are laid out from `start_pos`.
    pub fn slot_position(self, start_pos: f64, rank: usize, edge_spacing: f64) -> f64 {
        match self {
            Self::WestToEast | Self::NorthToSouth => start_pos + rank as f64 * edge_spacing,
            Self::SouthToNorth => start_pos - rank as f64 * edge_spacing,
        }
    }

    /// Outer border of a layer in routing direction, node margins included. `None` for an
    /// empty layer.
    pub fn layer_far_border(self, g: &LGraph, layer: LayerId) -> Option<f64> {
        let nodes = g.layer(layer).nodes.iter().map(|&n| g.node(n));
        match self {
            Self::WestToEast => nodes
                .map(|n| n.position.x + n.size.x + n.margin.right)
                .reduce(f64::max),
            Self::NorthToSouth => nodes
                .map(|n| n.position.y + n.size.y + n.margin.bottom)
                .reduce(f64::max),
            Self::SouthToNorth => nodes.map(|n| n.position.y - n.margin.top).reduce(f64::min),
        }
    }

    /// Trunk coordinate of slot 0 at the boundary following `left`.
    pub fn first_slot_position(
        self,
        g: &LGraph,
        left: Option<LayerId>,
        edge_node_spacing: f64,
    ) -> f64 {
        let Some(border) = left.and_then(|l| self.layer_far_border(g, l)) else {
            return 0.0;
        };
        match self {
            Self::WestToEast | Self::NorthToSouth => border + edge_node_spacing,
            Self::SouthToNorth => border - edge_node_spacing,
        }
    }
}
