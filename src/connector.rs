use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::{Arity, Pin};
use crate::network::GateId;

/// Which part of the source gate's output a connector reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Source produces one scalar
    Single,
    /// First (sum) component of a pair
    Primary,
    /// Second (carry) component of a pair
    Secondary,
}

/// Which slot of the destination a connector fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// First unbound general slot, `pinA` before `pinB`
    NextAvailable,
    CarryIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId(pub usize);

/// A directed edge from one gate's output channel to another gate's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub from: GateId,
    pub to: GateId,
    pub pin: Pin,
    pub channel: Channel,
}

impl Channel {
    /// Output arity a source must have for this channel to be readable.
    pub fn arity(self) -> Arity {
        match self {
            Channel::Single => Arity::Single,
            Channel::Primary | Channel::Secondary => Arity::Pair,
        }
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}
