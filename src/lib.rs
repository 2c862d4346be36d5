//! # logic_gates
//!
//! **Logic-gate networks with lazy, demand-driven evaluation.**
//!
//! Build a directed acyclic graph of gates, wire outputs into other gates'
//! slots, and pull a value out of any gate. Nothing is cached: each request
//! re-resolves everything upstream, so changing a literal between calls is
//! how a circuit is re-run with new inputs.
//!
//! ## Quick Start
//!
//! ```rust
//! use logic_gates::{ConstantProvider, Network, Output, Pin};
//!
//! let mut net = Network::new();
//! let adder = net.eight_bit_adder("ADD8");
//! net.set_pin(adder, Pin::A, 200).unwrap();
//! net.set_pin(adder, Pin::B, 100).unwrap();
//!
//! // 300 does not fit in a byte; the top carry is dropped
//! let out = net.output(adder, &mut ConstantProvider(0)).unwrap();
//! assert_eq!(out, Output::Single(44));
//! ```
//!
//! ## Key Concepts
//!
//! - **Gate**: one of AND, NAND, OR, NOR, XOR, NOT, half adder, full adder, byte adder
//! - **Slot**: a named input (`pin`, `pinA`, `pinB`, `carry_in`) that is unbound, a literal, or connected
//! - **Connector**: a wire from a gate's output channel (single, sum or carry) into a slot
//! - **Input provider**: where an unbound slot's value comes from when it is read
//! - **Netlist**: a text form of a network that parses, hashes and builds

mod circuits;
pub mod connector;
pub mod gate;
pub mod netlist;
pub mod network;
pub mod provider;

pub use circuits::ADDER_BITS;
pub use connector::{Channel, Connector, ConnectorId, Target};
pub use gate::{Arity, ArityMismatch, BinaryOp, GateKind, Output, Pin, Shape, Width};
pub use netlist::{BuiltNetlist, Netlist, NetlistError, NetlistHash};
pub use network::{Binding, ConnectError, EvalError, GateId, Network, PinError};
pub use provider::{
    ConsoleProvider, ConstantProvider, FnProvider, InputProvider, InputRequest, ProviderConfig,
    ProviderError, ScriptedProvider,
};
