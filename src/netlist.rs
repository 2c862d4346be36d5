//! # Netlist: text description of a gate network
//!
//! ```text
//! NETLIST v0
//! GATE <name> <KIND>
//! WIRE <src>[.sum|.carry] -> <dst>[.cin]
//! SET <gate>.<pin> = <value>
//! OUTPUT <name>
//! ```
//!
//! Sections appear in that order. `.sum` reads the primary half of a pair,
//! `.carry` the secondary half; `.cin` targets the carry-in slot instead of
//! the next free general slot. Lines starting with `#` are ignored.
//!
//! ## Example
//!
//! ```rust
//! use logic_gates::{ConstantProvider, Netlist, Output};
//!
//! let netlist = Netlist::parse(r#"
//!     NETLIST v0
//!     GATE ha HALF_ADDER
//!     GATE fa FULL_ADDER
//!     WIRE ha.carry -> fa.cin
//!     SET ha.pinA = 1
//!     SET ha.pinB = 1
//!     SET fa.pinA = 1
//!     SET fa.pinB = 0
//!     OUTPUT fa
//! "#).unwrap();
//!
//! let mut built = netlist.build().unwrap();
//! let outputs = built.evaluate(&mut ConstantProvider(0)).unwrap();
//! assert_eq!(outputs[0].1, Output::Pair(0, 1));
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::connector::{Channel, Target};
use crate::gate::{GateKind, Output, Pin};
use crate::network::{Binding, ConnectError, EvalError, GateId, Network, PinError};
use crate::provider::InputProvider;

/// Hex-encoded BLAKE3 of the canonical text.
pub type NetlistHash = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecl {
    pub name: String,
    pub kind: GateKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDecl {
    pub from: String,
    pub channel: Channel,
    pub to: String,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralDecl {
    pub gate: String,
    pub pin: Pin,
    pub value: u8,
}

/// A parsed, reference-checked network description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    pub gates: Vec<GateDecl>,
    #[serde(default)]
    pub wires: Vec<WireDecl>,
    #[serde(default)]
    pub literals: Vec<LiteralDecl>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetlistError {
    /// Input was empty or held only comments
    #[error("empty input")]
    Empty,
    /// First line is not "NETLIST v0"
    #[error("invalid header")]
    InvalidHeader,
    /// Unknown keyword or malformed GATE/WIRE/SET/OUTPUT line
    #[error("invalid line: {0}")]
    InvalidLine(String),
    /// A line from an earlier section after a later one
    #[error("line out of section order: {0}")]
    OutOfOrder(String),
    /// Gate name outside `[A-Za-z0-9_-]+`
    #[error("invalid gate name {0:?}")]
    InvalidName(String),
    #[error("duplicate gate name {0}")]
    DuplicateGate(String),
    /// WIRE, SET or OUTPUT names a gate that was never declared
    #[error("unknown gate {0}")]
    UnknownGate(String),
    #[error("gate {gate} has no slot {pin}")]
    InvalidPin { gate: String, pin: String },
    /// SET value does not fit the slot width
    #[error("value {value} for {gate}.{pin} is out of range")]
    OutOfRange { gate: String, pin: Pin, value: i64 },
    /// SET targets a slot a WIRE already fills
    #[error("{gate}.{pin} is already wired")]
    SlotWired { gate: String, pin: Pin },
    /// The network refused a WIRE
    #[error("wire {from} -> {to}: {source}")]
    Connect {
        from: String,
        to: String,
        #[source]
        source: ConnectError,
    },
    #[error(transparent)]
    Pin(#[from] PinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Gates,
    Wires,
    Literals,
    Outputs,
}

impl Netlist {
    pub fn parse(text: &str) -> Result<Self, NetlistError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        let (header, body) = lines.split_first().ok_or(NetlistError::Empty)?;
        if *header != "NETLIST v0" {
            return Err(NetlistError::InvalidHeader);
        }
        let mut netlist = Netlist::default();
        let mut section = Section::Gates;
        for &line in body {
            let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let next = match keyword {
                "GATE" => Section::Gates,
                "WIRE" => Section::Wires,
                "SET" => Section::Literals,
                "OUTPUT" => Section::Outputs,
                _ => return Err(NetlistError::InvalidLine(line.to_string())),
            };
            if next < section {
                return Err(NetlistError::OutOfOrder(line.to_string()));
            }
            section = next;
            let invalid = || NetlistError::InvalidLine(line.to_string());
            match next {
                Section::Gates => netlist.gates.push(parse_gate(rest).ok_or_else(invalid)?),
                Section::Wires => netlist.wires.push(parse_wire(rest).ok_or_else(invalid)?),
                Section::Literals => {
                    let (gate, pin, value) = parse_literal(rest).ok_or_else(invalid)?;
                    let literal = netlist.literal(gate, pin, value)?;
                    netlist.literals.push(literal);
                }
                Section::Outputs => netlist.outputs.push(parse_name(rest.trim()).ok_or_else(invalid)?),
            }
        }
        netlist.validate()?;
        Ok(netlist)
    }

    /// Read a netlist from disk: `.json` files as serialized [`Netlist`], anything else as text.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let netlist = if path.extension().is_some_and(|ext| ext == "json") {
            let netlist: Netlist = serde_json::from_str(&text)?;
            netlist.validate()?;
            netlist
        } else {
            Netlist::parse(&text)?
        };
        Ok(netlist)
    }

    pub fn canonical_text(&self) -> String {
        let mut lines = vec!["NETLIST v0".to_string()];
        for gate in &self.gates {
            lines.push(format!("GATE {} {}", gate.name, gate.kind));
        }
        for wire in &self.wires {
            let suffix = match wire.channel {
                Channel::Single => "",
                Channel::Primary => ".sum",
                Channel::Secondary => ".carry",
            };
            let target = match wire.target {
                Target::NextAvailable => "",
                Target::CarryIn => ".cin",
            };
            lines.push(format!("WIRE {}{} -> {}{}", wire.from, suffix, wire.to, target));
        }
        for lit in &self.literals {
            lines.push(format!("SET {}.{} = {}", lit.gate, lit.pin, lit.value));
        }
        for out in &self.outputs {
            lines.push(format!("OUTPUT {}", out));
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn hash(&self) -> NetlistHash {
        let digest = blake3::hash(self.canonical_text().as_bytes());
        hex::encode(digest.as_bytes())
    }

    /// Check names are well formed and unique, and every reference, pin and value fits its gate.
    pub fn validate(&self) -> Result<(), NetlistError> {
        let mut seen = HashSet::new();
        for gate in &self.gates {
            parse_name(&gate.name).ok_or_else(|| NetlistError::InvalidName(gate.name.clone()))?;
            if !seen.insert(gate.name.as_str()) {
                return Err(NetlistError::DuplicateGate(gate.name.clone()));
            }
        }
        for wire in &self.wires {
            self.kind_of(&wire.from)?;
            self.kind_of(&wire.to)?;
        }
        for lit in &self.literals {
            self.literal(&lit.gate, lit.pin.name(), i64::from(lit.value))?;
        }
        for out in &self.outputs {
            self.kind_of(out)?;
        }
        Ok(())
    }

    fn kind_of(&self, name: &str) -> Result<GateKind, NetlistError> {
        self.gates
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.kind)
            .ok_or_else(|| NetlistError::UnknownGate(name.to_string()))
    }

    fn literal(&self, gate: &str, pin: &str, value: i64) -> Result<LiteralDecl, NetlistError> {
        let kind = self.kind_of(gate)?;
        let pin = Pin::from_name(pin)
            .filter(|p| kind.shape().has(*p))
            .ok_or_else(|| NetlistError::InvalidPin {
                gate: gate.to_string(),
                pin: pin.to_string(),
            })?;
        let value = kind.width(pin).check(value).ok_or_else(|| NetlistError::OutOfRange {
            gate: gate.to_string(),
            pin,
            value,
        })?;
        Ok(LiteralDecl {
            gate: gate.to_string(),
            pin,
            value,
        })
    }

    /// Instantiate the gates, then wires, then literals, in declaration order.
    ///
    /// A SET on a slot that one of the WIREs filled is rejected rather than
    /// silently detaching the wire.
    pub fn build(&self) -> Result<BuiltNetlist, NetlistError> {
        let mut network = Network::new();
        let mut ids = BTreeMap::new();
        for gate in &self.gates {
            if ids.contains_key(&gate.name) {
                return Err(NetlistError::DuplicateGate(gate.name.clone()));
            }
            let id = network.add_gate(gate.kind, gate.name.clone());
            ids.insert(gate.name.clone(), id);
        }
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| NetlistError::UnknownGate(name.to_string()))
        };
        for wire in &self.wires {
            let (from, to) = (lookup(&wire.from)?, lookup(&wire.to)?);
            network
                .connect(from, to, wire.channel, wire.target)
                .map_err(|source| NetlistError::Connect {
                    from: wire.from.clone(),
                    to: wire.to.clone(),
                    source,
                })?;
        }
        for lit in &self.literals {
            let gate = lookup(&lit.gate)?;
            if let Some(Binding::Connected(_)) = network.binding(gate, lit.pin) {
                return Err(NetlistError::SlotWired {
                    gate: lit.gate.clone(),
                    pin: lit.pin,
                });
            }
            network.set_pin(gate, lit.pin, lit.value)?;
        }
        let outputs = self
            .outputs
            .iter()
            .map(|name| Ok((name.clone(), lookup(name)?)))
            .collect::<Result<Vec<_>, NetlistError>>()?;
        Ok(BuiltNetlist {
            network,
            ids,
            outputs,
        })
    }
}

/// A netlist instantiated into a live [`Network`].
#[derive(Debug, Clone)]
pub struct BuiltNetlist {
    pub network: Network,
    ids: BTreeMap<String, GateId>,
    outputs: Vec<(String, GateId)>,
}

impl BuiltNetlist {
    pub fn gate(&self, name: &str) -> Option<GateId> {
        self.ids.get(name).copied()
    }

    pub fn outputs(&self) -> &[(String, GateId)] {
        &self.outputs
    }

    /// Evaluate every declared output, in declaration order.
    pub fn evaluate<P>(&mut self, provider: &mut P) -> Result<Vec<(String, Output)>, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        let mut results = Vec::with_capacity(self.outputs.len());
        for (name, gate) in &self.outputs {
            results.push((name.clone(), self.network.output(*gate, provider)?));
        }
        Ok(results)
    }
}

fn parse_name(text: &str) -> Option<String> {
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| text.to_string())
}

fn parse_gate(rest: &str) -> Option<GateDecl> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [name, kind] => Some(GateDecl {
            name: parse_name(name)?,
            kind: GateKind::from_str(kind)?,
        }),
        _ => None,
    }
}

fn parse_wire(rest: &str) -> Option<WireDecl> {
    let (src, dst) = rest.split_once("->")?;
    let (from, channel) = match src.trim().split_once('.') {
        None => (src.trim(), Channel::Single),
        Some((name, "sum")) => (name, Channel::Primary),
        Some((name, "carry")) => (name, Channel::Secondary),
        Some(_) => return None,
    };
    let (to, target) = match dst.trim().split_once('.') {
        None => (dst.trim(), Target::NextAvailable),
        Some((name, "cin")) => (name, Target::CarryIn),
        Some(_) => return None,
    };
    Some(WireDecl {
        from: parse_name(from)?,
        channel,
        to: parse_name(to)?,
        target,
    })
}

fn parse_literal(rest: &str) -> Option<(&str, &str, i64)> {
    let (lhs, rhs) = rest.split_once('=')?;
    let (gate, pin) = lhs.trim().split_once('.')?;
    let value = rhs.trim().parse::<i64>().ok()?;
    Some((gate, pin, value))
}
