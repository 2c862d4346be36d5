//! # Network: gates, slots and connectors
//!
//! A [`Network`] is an arena of gates addressed by [`GateId`]. Each gate
//! carries the slots its [`Shape`] names, and every slot holds exactly one
//! [`Binding`]: unbound, a literal, or a connector from an upstream gate.
//!
//! Evaluation is pull-based and uncached. Asking for a gate's output
//! resolves its slots, and a connected slot recursively asks its source for
//! an output. The same upstream gate is recomputed once per read.
//!
//! Literal assignment and wiring share one budget per slot: a slot holding
//! a literal counts as filled for [`Target::NextAvailable`] and for the
//! carry-in slot. A literal always overwrites, including a connection, which
//! is then detached from the graph.
//!
//! ## Example
//!
//! ```rust
//! use logic_gates::{Channel, ConstantProvider, Network, Pin, Target};
//!
//! // NOT((A and B) or (C and D))
//! let mut net = Network::new();
//! let g1 = net.and("G1");
//! let g2 = net.and("G2");
//! let g3 = net.or("G3");
//! let g4 = net.not("G4");
//! net.connect(g1, g3, Channel::Single, Target::NextAvailable).unwrap();
//! net.connect(g2, g3, Channel::Single, Target::NextAvailable).unwrap();
//! net.connect(g3, g4, Channel::Single, Target::NextAvailable).unwrap();
//!
//! net.set_pin(g1, Pin::A, 1).unwrap();
//! net.set_pin(g1, Pin::B, 1).unwrap();
//! net.set_pin(g2, Pin::A, 0).unwrap();
//! net.set_pin(g2, Pin::B, 0).unwrap();
//!
//! let out = net.output(g4, &mut ConstantProvider(0)).unwrap();
//! assert_eq!(out.single().unwrap(), 0);
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

use crate::circuits::Circuit;
use crate::connector::{Channel, Connector, ConnectorId, Target};
use crate::gate::{invert, Arity, ArityMismatch, GateKind, Output, Pin, Shape};
use crate::provider::{InputProvider, InputRequest, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(pub usize);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// State of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Read from the input provider on every evaluation
    Unbound,
    Literal(u8),
    Connected(ConnectorId),
}

/// Rejected connection. The network is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// Either endpoint is not a gate of this network
    #[error("unknown gate {0}")]
    UnknownGate(GateId),
    /// Every general slot of the destination is already bound
    #[error("no empty pins on gate {gate}")]
    NoEmptySlots { gate: String },
    /// Carry-in target already holds a literal or connection
    #[error("{pin} already bound on gate {gate}")]
    SlotOccupied { gate: String, pin: Pin },
    #[error("gate {gate} has no carry_in")]
    NoCarryIn { gate: String },
    /// Single channel on a pair source, or a pair channel on a scalar source
    #[error("channel {channel:?} cannot read the {arity:?} output of gate {gate}")]
    ChannelMismatch {
        gate: String,
        channel: Channel,
        arity: Arity,
    },
    /// Destination already feeds the source (or is the source)
    #[error("wiring {from} -> {to} would close a cycle")]
    Cycle { from: String, to: String },
}

/// Rejected literal assignment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("unknown gate {0}")]
    UnknownGate(GateId),
    /// Pin is not part of the gate's shape
    #[error("gate {gate} has no slot {pin}")]
    NoSuchPin { gate: String, pin: Pin },
    /// Literal wider than the pin accepts
    #[error("value {value} for {gate}.{pin} is outside 0..={max}")]
    OutOfRange {
        gate: String,
        pin: Pin,
        value: i64,
        max: u8,
    },
}

/// Failure while pulling a value through the network.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unknown gate {0}")]
    UnknownGate(GateId),
    #[error("gate {gate} has no slot {pin}")]
    NoSuchPin { gate: String, pin: Pin },
    /// Provider or upstream gate produced a value the consuming pin cannot hold
    #[error("value {value} for {gate}.{pin} is outside 0..={max}")]
    OutOfRange {
        gate: String,
        pin: Pin,
        value: i64,
        max: u8,
    },
    /// A gate's output was read through the wrong channel
    #[error("reading gate {gate}: {source}")]
    Arity {
        gate: String,
        #[source]
        source: ArityMismatch,
    },
    /// The input provider failed or ran dry
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone)]
struct GateNode {
    label: String,
    kind: GateKind,
    slots: Vec<(Pin, Binding)>,
    circuit: Option<Box<Circuit>>,
}

impl GateNode {
    fn binding(&self, pin: Pin) -> Option<Binding> {
        self.slots
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, binding)| *binding)
    }

    fn bind(&mut self, pin: Pin, binding: Binding) {
        if let Some(slot) = self.slots.iter_mut().find(|(p, _)| *p == pin) {
            slot.1 = binding;
        }
    }

    fn sources(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.slots.iter().filter_map(|(_, binding)| match binding {
            Binding::Connected(id) => Some(*id),
            _ => None,
        })
    }
}

/// A directed acyclic graph of gates.
#[derive(Debug, Clone, Default)]
pub struct Network {
    gates: Vec<GateNode>,
    connectors: Vec<Connector>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gate with every slot unbound. Composite kinds wire their
    /// private sub-graph here, once.
    pub fn add_gate(&mut self, kind: GateKind, label: impl Into<String>) -> GateId {
        let label = label.into();
        let slots = kind
            .shape()
            .pins()
            .iter()
            .map(|pin| (*pin, Binding::Unbound))
            .collect();
        let circuit = Circuit::build(kind, &label).map(Box::new);
        let id = GateId(self.gates.len());
        trace!("add gate {} {} ({})", id, label, kind);
        self.gates.push(GateNode {
            label,
            kind,
            slots,
            circuit,
        });
        id
    }

    pub fn and(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::And, label)
    }

    pub fn nand(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::Nand, label)
    }

    pub fn or(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::Or, label)
    }

    pub fn nor(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::Nor, label)
    }

    pub fn xor(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::Xor, label)
    }

    pub fn not(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::Not, label)
    }

    pub fn half_adder(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::HalfAdder, label)
    }

    pub fn full_adder(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::FullAdder, label)
    }

    pub fn eight_bit_adder(&mut self, label: impl Into<String>) -> GateId {
        self.add_gate(GateKind::EightBitAdder, label)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn label(&self, gate: GateId) -> Option<&str> {
        self.gates.get(gate.0).map(|node| node.label.as_str())
    }

    pub fn kind(&self, gate: GateId) -> Option<GateKind> {
        self.gates.get(gate.0).map(|node| node.kind)
    }

    /// First gate carrying `label`. Labels are not required to be unique.
    pub fn find(&self, label: &str) -> Option<GateId> {
        self.gates
            .iter()
            .position(|node| node.label == label)
            .map(GateId)
    }

    pub fn binding(&self, gate: GateId, pin: Pin) -> Option<Binding> {
        self.gates.get(gate.0)?.binding(pin)
    }

    /// Every connector ever built, including ones a literal has since detached.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id.0)
    }

    /// Bind a literal to `pin`, replacing whatever was there.
    pub fn set_pin(&mut self, gate: GateId, pin: Pin, value: u8) -> Result<(), PinError> {
        let node = self.gates.get_mut(gate.0).ok_or(PinError::UnknownGate(gate))?;
        let previous = node.binding(pin).ok_or_else(|| PinError::NoSuchPin {
            gate: node.label.clone(),
            pin,
        })?;
        let width = node.kind.width(pin);
        if value > width.max() {
            return Err(PinError::OutOfRange {
                gate: node.label.clone(),
                pin,
                value: value.into(),
                max: width.max(),
            });
        }
        if let Binding::Connected(id) = previous {
            debug!("literal on {}.{} detaches connector {}", node.label, pin, id);
        }
        node.bind(pin, Binding::Literal(value));
        Ok(())
    }

    /// Literal injection for values that are already range-checked.
    pub(crate) fn inject(&mut self, gate: GateId, pin: Pin, value: u8) {
        if let Some(node) = self.gates.get_mut(gate.0) {
            node.bind(pin, Binding::Literal(value));
        }
    }

    /// Wire `from`'s output channel into a slot of `to`.
    pub fn connect(
        &mut self,
        from: GateId,
        to: GateId,
        channel: Channel,
        target: Target,
    ) -> Result<ConnectorId, ConnectError> {
        let pin = self.select_slot(from, to, channel, target).map_err(|err| {
            debug!("connect {} -> {} rejected: {}", from, to, err);
            err
        })?;
        Ok(self.bind(from, to, pin, channel))
    }

    fn select_slot(
        &self,
        from: GateId,
        to: GateId,
        channel: Channel,
        target: Target,
    ) -> Result<Pin, ConnectError> {
        let source = self.gates.get(from.0).ok_or(ConnectError::UnknownGate(from))?;
        let dest = self.gates.get(to.0).ok_or(ConnectError::UnknownGate(to))?;
        let arity = source.kind.arity();
        if channel.arity() != arity {
            return Err(ConnectError::ChannelMismatch {
                gate: source.label.clone(),
                channel,
                arity,
            });
        }
        let shape: Shape = dest.kind.shape();
        let pin = match target {
            Target::CarryIn => {
                if !shape.has(Pin::CarryIn) {
                    return Err(ConnectError::NoCarryIn {
                        gate: dest.label.clone(),
                    });
                }
                if dest.binding(Pin::CarryIn) != Some(Binding::Unbound) {
                    return Err(ConnectError::SlotOccupied {
                        gate: dest.label.clone(),
                        pin: Pin::CarryIn,
                    });
                }
                Pin::CarryIn
            }
            Target::NextAvailable => shape
                .general_pins()
                .iter()
                .copied()
                .find(|pin| dest.binding(*pin) == Some(Binding::Unbound))
                .ok_or_else(|| ConnectError::NoEmptySlots {
                    gate: dest.label.clone(),
                })?,
        };
        if self.depends_on(from, to) {
            return Err(ConnectError::Cycle {
                from: source.label.clone(),
                to: dest.label.clone(),
            });
        }
        Ok(pin)
    }

    /// Record a connector without validation. Used for fixed internal wiring.
    pub(crate) fn bind(&mut self, from: GateId, to: GateId, pin: Pin, channel: Channel) -> ConnectorId {
        let id = ConnectorId(self.connectors.len());
        self.connectors.push(Connector {
            from,
            to,
            pin,
            channel,
        });
        if let Some(node) = self.gates.get_mut(to.0) {
            node.bind(pin, Binding::Connected(id));
        }
        debug!("connector {} {} -> {}.{} {:?}", id, from, to, pin, channel);
        id
    }

    /// True when `gate` reads, directly or transitively, from `upstream`.
    pub fn depends_on(&self, gate: GateId, upstream: GateId) -> bool {
        let mut stack = vec![gate];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == upstream {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.gates.get(current.0) {
                stack.extend(node.sources().map(|id| self.connectors[id.0].from));
            }
        }
        false
    }

    /// Gates ordered so every gate follows the gates it reads from.
    pub fn topological_order(&self) -> Vec<GateId> {
        let mut indegree: Vec<usize> = self.gates.iter().map(|n| n.sources().count()).collect();
        let mut readers: Vec<Vec<GateId>> = vec![Vec::new(); self.gates.len()];
        for (idx, node) in self.gates.iter().enumerate() {
            for id in node.sources() {
                readers[self.connectors[id.0].from.0].push(GateId(idx));
            }
        }
        let mut queue: VecDeque<GateId> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(idx, _)| GateId(idx))
            .collect();
        let mut order = Vec::with_capacity(self.gates.len());
        while let Some(gate) = queue.pop_front() {
            order.push(gate);
            for reader in &readers[gate.0] {
                indegree[reader.0] -= 1;
                if indegree[reader.0] == 0 {
                    queue.push_back(*reader);
                }
            }
        }
        debug_assert_eq!(order.len(), self.gates.len(), "network contains a cycle");
        order
    }

    /// Compute `gate`'s output, pulling every upstream value afresh.
    pub fn output<P>(&mut self, gate: GateId, provider: &mut P) -> Result<Output, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        let node = self.gates.get_mut(gate.0).ok_or(EvalError::UnknownGate(gate))?;
        let kind = node.kind;
        trace!("evaluate {} {} ({})", gate, node.label, kind);
        let circuit = node.circuit.take();
        if let Some(mut circuit) = circuit {
            let result = circuit.evaluate(self, gate, provider);
            self.gates[gate.0].circuit = Some(circuit);
            return result;
        }
        let value = match kind.binary_op() {
            Some(op) => {
                let a = self.resolve(gate, Pin::A, provider)?;
                let b = self.resolve(gate, Pin::B, provider)?;
                op.apply(a, b)
            }
            None => invert(self.resolve(gate, Pin::Input, provider)?),
        };
        Ok(Output::Single(value))
    }

    /// Compute `gate`'s output and read one channel of it.
    pub fn output_channel<P>(
        &mut self,
        gate: GateId,
        channel: Channel,
        provider: &mut P,
    ) -> Result<u8, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        let out = self.output(gate, provider)?;
        out.select(channel).map_err(|source| EvalError::Arity {
            gate: self.label_or_id(gate),
            source,
        })
    }

    /// Turn one slot into a concrete value.
    pub fn resolve<P>(&mut self, gate: GateId, pin: Pin, provider: &mut P) -> Result<u8, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        let node = self.gates.get(gate.0).ok_or(EvalError::UnknownGate(gate))?;
        let width = node.kind.width(pin);
        let binding = node.binding(pin).ok_or_else(|| EvalError::NoSuchPin {
            gate: node.label.clone(),
            pin,
        })?;
        let raw = match binding {
            Binding::Literal(value) => return Ok(value),
            Binding::Unbound => {
                debug!("querying provider for {}.{}", node.label, pin);
                provider.provide(&InputRequest {
                    gate: &node.label,
                    pin: pin.name(),
                    width,
                })?
            }
            Binding::Connected(id) => {
                let connector = self.connectors[id.0];
                i64::from(self.output_channel(connector.from, connector.channel, provider)?)
            }
        };
        width.check(raw).ok_or_else(|| EvalError::OutOfRange {
            gate: self.label_or_id(gate),
            pin,
            value: raw,
            max: width.max(),
        })
    }

    fn label_or_id(&self, gate: GateId) -> String {
        self.label(gate)
            .map(str::to_string)
            .unwrap_or_else(|| gate.to_string())
    }
}
