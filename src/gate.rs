//! Gate kinds, slot shapes and output values.
//!
//! Every gate in a [`Network`](crate::Network) is one of the [`GateKind`]
//! variants. The kind fixes the slot [`Shape`], the width of each slot and
//! the [`Arity`] of the output, so a connector can be checked against its
//! source before it is ever evaluated.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::connector::Channel;

/// The closed set of gate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Not,
    /// XOR + AND over the same two inputs, yields (sum, carry)
    HalfAdder,
    /// Two half adders and an OR, yields (sum, carry)
    FullAdder,
    /// Half adder chained through seven full adders; adds two bytes modulo 256
    EightBitAdder,
}

/// Primitive two-input boolean functions over 0/1 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Nand,
    Or,
    Nor,
    Xor,
}

impl BinaryOp {
    pub fn apply(self, a: u8, b: u8) -> u8 {
        let (a, b) = (a == 1, b == 1);
        let out = match self {
            BinaryOp::And => a && b,
            BinaryOp::Nand => !(a && b),
            BinaryOp::Or => a || b,
            BinaryOp::Nor => !(a || b),
            BinaryOp::Xor => a != b,
        };
        out as u8
    }
}

/// NOT over a 0/1 value.
pub fn invert(value: u8) -> u8 {
    (value == 0) as u8
}

/// Number and names of the input slots a gate carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// One slot: `pin`
    Unary,
    /// `pinA`, `pinB`
    Binary,
    /// `pinA`, `pinB`, `carry_in`
    Ternary,
}

/// A single named input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pin {
    Input,
    A,
    B,
    CarryIn,
}

/// Whether a gate produces one scalar or an ordered (primary, secondary) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    Pair,
}

/// Range of values a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Width {
    /// 0 or 1
    Bit,
    /// 0..=255
    Byte,
}

/// The result of evaluating a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Single(u8),
    Pair(u8, u8),
}

/// Raised when an [`Output`] is read with the wrong arity.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("expected {expected:?} output, got {actual:?}")]
pub struct ArityMismatch {
    pub expected: Arity,
    pub actual: Arity,
}

impl GateKind {
    pub const ALL: [GateKind; 9] = [
        GateKind::And,
        GateKind::Nand,
        GateKind::Or,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Not,
        GateKind::HalfAdder,
        GateKind::FullAdder,
        GateKind::EightBitAdder,
    ];

    pub fn shape(self) -> Shape {
        match self {
            GateKind::Not => Shape::Unary,
            GateKind::FullAdder | GateKind::EightBitAdder => Shape::Ternary,
            _ => Shape::Binary,
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            GateKind::HalfAdder | GateKind::FullAdder => Arity::Pair,
            _ => Arity::Single,
        }
    }

    /// Width accepted on `pin`. Only the byte adder's operand pins are wider than a bit.
    pub fn width(self, pin: Pin) -> Width {
        match (self, pin) {
            (GateKind::EightBitAdder, Pin::A | Pin::B) => Width::Byte,
            _ => Width::Bit,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            GateKind::HalfAdder | GateKind::FullAdder | GateKind::EightBitAdder
        )
    }

    /// Mnemonic used by the netlist format.
    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Nand => "NAND",
            GateKind::Or => "OR",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Not => "NOT",
            GateKind::HalfAdder => "HALF_ADDER",
            GateKind::FullAdder => "FULL_ADDER",
            GateKind::EightBitAdder => "EIGHT_BIT_ADDER",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        GateKind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// The two-input truth table behind a primitive binary gate.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            GateKind::And => Some(BinaryOp::And),
            GateKind::Nand => Some(BinaryOp::Nand),
            GateKind::Or => Some(BinaryOp::Or),
            GateKind::Nor => Some(BinaryOp::Nor),
            GateKind::Xor => Some(BinaryOp::Xor),
            _ => None,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Shape {
    /// Every slot of the shape, in order.
    pub fn pins(self) -> &'static [Pin] {
        match self {
            Shape::Unary => &[Pin::Input],
            Shape::Binary => &[Pin::A, Pin::B],
            Shape::Ternary => &[Pin::A, Pin::B, Pin::CarryIn],
        }
    }

    /// Slots filled by default-order connections. Carry-in is never among them.
    pub fn general_pins(self) -> &'static [Pin] {
        match self {
            Shape::Unary => &[Pin::Input],
            Shape::Binary | Shape::Ternary => &[Pin::A, Pin::B],
        }
    }

    pub fn has(self, pin: Pin) -> bool {
        self.pins().contains(&pin)
    }
}

impl Pin {
    pub fn name(self) -> &'static str {
        match self {
            Pin::Input => "pin",
            Pin::A => "pinA",
            Pin::B => "pinB",
            Pin::CarryIn => "carry_in",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Pin::Input, Pin::A, Pin::B, Pin::CarryIn]
            .into_iter()
            .find(|p| p.name() == name)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Width {
    pub fn max(self) -> u8 {
        match self {
            Width::Bit => 1,
            Width::Byte => u8::MAX,
        }
    }

    /// Narrow `value` into this width, or `None` if it does not fit.
    pub fn check(self, value: i64) -> Option<u8> {
        u8::try_from(value).ok().filter(|v| *v <= self.max())
    }
}

impl Output {
    pub fn arity(&self) -> Arity {
        match self {
            Output::Single(_) => Arity::Single,
            Output::Pair(..) => Arity::Pair,
        }
    }

    pub fn single(self) -> Result<u8, ArityMismatch> {
        match self {
            Output::Single(v) => Ok(v),
            Output::Pair(..) => Err(ArityMismatch {
                expected: Arity::Single,
                actual: Arity::Pair,
            }),
        }
    }

    pub fn pair(self) -> Result<(u8, u8), ArityMismatch> {
        match self {
            Output::Pair(primary, secondary) => Ok((primary, secondary)),
            Output::Single(_) => Err(ArityMismatch {
                expected: Arity::Pair,
                actual: Arity::Single,
            }),
        }
    }

    /// Read the component a connector's channel names.
    pub fn select(self, channel: Channel) -> Result<u8, ArityMismatch> {
        match channel {
            Channel::Single => self.single(),
            Channel::Primary => self.pair().map(|(primary, _)| primary),
            Channel::Secondary => self.pair().map(|(_, secondary)| secondary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_truth_tables() {
        let cases: [(GateKind, [u8; 4]); 5] = [
            (GateKind::And, [0, 0, 0, 1]),
            (GateKind::Nand, [1, 1, 1, 0]),
            (GateKind::Or, [0, 1, 1, 1]),
            (GateKind::Nor, [1, 0, 0, 0]),
            (GateKind::Xor, [0, 1, 1, 0]),
        ];
        for (kind, expected) in cases {
            let op = kind.binary_op().unwrap();
            for (idx, (a, b)) in [(0, 0), (0, 1), (1, 0), (1, 1)].into_iter().enumerate() {
                assert_eq!(op.apply(a, b), expected[idx], "{kind}({a},{b})");
            }
        }
        assert_eq!(GateKind::Not.binary_op(), None);
        assert_eq!(invert(0), 1);
        assert_eq!(invert(1), 0);
    }

    #[test]
    fn shapes_and_arities() {
        assert_eq!(GateKind::Not.shape().pins(), &[Pin::Input]);
        assert_eq!(GateKind::FullAdder.shape().general_pins(), &[Pin::A, Pin::B]);
        assert!(GateKind::EightBitAdder.shape().has(Pin::CarryIn));
        assert!(!GateKind::HalfAdder.shape().has(Pin::CarryIn));
        assert_eq!(GateKind::HalfAdder.arity(), Arity::Pair);
        assert_eq!(GateKind::EightBitAdder.arity(), Arity::Single);
        assert_eq!(GateKind::EightBitAdder.width(Pin::A), Width::Byte);
        assert_eq!(GateKind::EightBitAdder.width(Pin::CarryIn), Width::Bit);
        assert!(GateKind::FullAdder.is_composite());
        assert!(!GateKind::Xor.is_composite());
        assert_eq!(Output::Pair(1, 0).arity(), Arity::Pair);
    }

    #[test]
    fn width_check_rejects_out_of_range() {
        assert_eq!(Width::Bit.check(1), Some(1));
        assert_eq!(Width::Bit.check(2), None);
        assert_eq!(Width::Bit.check(-1), None);
        assert_eq!(Width::Byte.check(255), Some(255));
        assert_eq!(Width::Byte.check(256), None);
    }

    #[test]
    fn select_reads_channel() {
        let pair = Output::Pair(0, 1);
        assert_eq!(pair.select(Channel::Primary), Ok(0));
        assert_eq!(pair.select(Channel::Secondary), Ok(1));
        assert!(pair.select(Channel::Single).is_err());
        assert!(Output::Single(1).select(Channel::Primary).is_err());
    }

    #[test]
    fn names_round_trip() {
        for kind in GateKind::ALL {
            assert_eq!(GateKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(Pin::from_name("carry_in"), Some(Pin::CarryIn));
        assert_eq!(Pin::from_name("pinC"), None);
    }
}
