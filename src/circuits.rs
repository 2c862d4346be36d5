//! Composite circuits.
//!
//! A composite gate owns a private [`Network`] wired once when the gate is
//! created. Evaluating it resolves the composite's own slots in the outer
//! network, injects the resolved values as literals into the sub-gates,
//! then pulls sub-gate outputs in a fixed order.
//!
//! Injection rather than wiring matters for the half adder: its XOR and AND
//! must see the same already-resolved pair of inputs, not re-resolve an
//! upstream connector twice.

use log::trace;

use crate::connector::Channel;
use crate::gate::{GateKind, Output, Pin};
use crate::network::{EvalError, GateId, Network};
use crate::provider::InputProvider;

/// Stages in the byte adder: one half adder then seven full adders.
pub const ADDER_BITS: usize = 8;

#[derive(Debug, Clone)]
pub(crate) enum Circuit {
    HalfAdder(HalfAdder),
    FullAdder(FullAdder),
    EightBitAdder(EightBitAdder),
}

impl Circuit {
    pub(crate) fn build(kind: GateKind, label: &str) -> Option<Self> {
        match kind {
            GateKind::HalfAdder => Some(Circuit::HalfAdder(HalfAdder::new(label))),
            GateKind::FullAdder => Some(Circuit::FullAdder(FullAdder::new(label))),
            GateKind::EightBitAdder => Some(Circuit::EightBitAdder(EightBitAdder::new(label))),
            _ => None,
        }
    }

    /// Resolve `gate`'s slots in `outer` and run the private sub-graph.
    pub(crate) fn evaluate<P>(
        &mut self,
        outer: &mut Network,
        gate: GateId,
        provider: &mut P,
    ) -> Result<Output, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        let a = outer.resolve(gate, Pin::A, provider)?;
        let b = outer.resolve(gate, Pin::B, provider)?;
        match self {
            Circuit::HalfAdder(half) => {
                let (sum, carry) = half.evaluate(a, b, provider)?;
                Ok(Output::Pair(sum, carry))
            }
            Circuit::FullAdder(full) => {
                let carry_in = outer.resolve(gate, Pin::CarryIn, provider)?;
                let (sum, carry) = full.evaluate(a, b, carry_in, provider)?;
                Ok(Output::Pair(sum, carry))
            }
            // carry_in is never read at the top level
            Circuit::EightBitAdder(adder) => Ok(Output::Single(adder.evaluate(a, b, provider)?)),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HalfAdder {
    net: Network,
    xor: GateId,
    and: GateId,
}

impl HalfAdder {
    fn new(label: &str) -> Self {
        let mut net = Network::new();
        let xor = net.xor(format!("{label}_XOR"));
        let and = net.and(format!("{label}_AND"));
        Self { net, xor, and }
    }

    fn evaluate<P>(&mut self, a: u8, b: u8, provider: &mut P) -> Result<(u8, u8), EvalError>
    where
        P: InputProvider + ?Sized,
    {
        for gate in [self.xor, self.and] {
            self.net.inject(gate, Pin::A, a);
            self.net.inject(gate, Pin::B, b);
        }
        let sum = self.net.output_channel(self.xor, Channel::Single, provider)?;
        let carry = self.net.output_channel(self.and, Channel::Single, provider)?;
        Ok((sum, carry))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FullAdder {
    net: Network,
    first: GateId,
    second: GateId,
    or: GateId,
}

impl FullAdder {
    fn new(label: &str) -> Self {
        let mut net = Network::new();
        let first = net.half_adder(format!("{label}_HA1"));
        let second = net.half_adder(format!("{label}_HA2"));
        let or = net.or(format!("{label}_OR"));
        net.bind(first, second, Pin::A, Channel::Primary);
        net.bind(first, or, Pin::A, Channel::Secondary);
        net.bind(second, or, Pin::B, Channel::Secondary);
        Self {
            net,
            first,
            second,
            or,
        }
    }

    fn evaluate<P>(
        &mut self,
        a: u8,
        b: u8,
        carry_in: u8,
        provider: &mut P,
    ) -> Result<(u8, u8), EvalError>
    where
        P: InputProvider + ?Sized,
    {
        self.net.inject(self.first, Pin::A, a);
        self.net.inject(self.first, Pin::B, b);
        self.net.inject(self.second, Pin::B, carry_in);
        let sum = self.net.output_channel(self.second, Channel::Primary, provider)?;
        let carry = self.net.output_channel(self.or, Channel::Single, provider)?;
        Ok((sum, carry))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EightBitAdder {
    net: Network,
    stages: Vec<GateId>,
}

impl EightBitAdder {
    fn new(label: &str) -> Self {
        let mut net = Network::new();
        let mut stages = Vec::with_capacity(ADDER_BITS);
        stages.push(net.half_adder(format!("{label}_HA1")));
        for idx in 1..ADDER_BITS {
            let stage = net.full_adder(format!("{label}_FA{}", idx + 1));
            net.bind(stages[idx - 1], stage, Pin::CarryIn, Channel::Secondary);
            stages.push(stage);
        }
        Self { net, stages }
    }

    /// Sum of two bytes; the carry out of the top stage is dropped.
    fn evaluate<P>(&mut self, a: u8, b: u8, provider: &mut P) -> Result<u8, EvalError>
    where
        P: InputProvider + ?Sized,
    {
        for (idx, stage) in self.stages.iter().enumerate() {
            self.net.inject(*stage, Pin::A, (a >> idx) & 1);
            self.net.inject(*stage, Pin::B, (b >> idx) & 1);
        }
        let mut bits = Vec::with_capacity(ADDER_BITS);
        for stage in &self.stages {
            bits.push(self.net.output_channel(*stage, Channel::Primary, provider)?);
        }
        let sum = bits.iter().rev().fold(0u8, |acc, bit| (acc << 1) | bit);
        trace!("byte adder {} + {} -> bits {:?} = {}", a, b, bits, sum);
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Target;
    use crate::provider::{ConstantProvider, ScriptedProvider};
    use crate::Binding;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;
    use test_log::test;

    fn pair(net: &mut Network, gate: GateId) -> (u8, u8) {
        net.output(gate, &mut ConstantProvider(0))
            .unwrap()
            .pair()
            .unwrap()
    }

    #[test]
    fn half_adder_table() {
        let mut net = Network::new();
        let half = net.half_adder("HA");
        for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            net.set_pin(half, Pin::A, a).unwrap();
            net.set_pin(half, Pin::B, b).unwrap();
            assert_eq!(pair(&mut net, half), (a ^ b, a & b), "HA({a},{b})");
        }
    }

    #[test]
    fn full_adder_table() {
        let mut net = Network::new();
        let full = net.full_adder("FA");
        for a in 0..=1u8 {
            for b in 0..=1u8 {
                for c in 0..=1u8 {
                    net.set_pin(full, Pin::A, a).unwrap();
                    net.set_pin(full, Pin::B, b).unwrap();
                    net.set_pin(full, Pin::CarryIn, c).unwrap();
                    let total = a + b + c;
                    assert_eq!(pair(&mut net, full), (total & 1, total >> 1), "FA({a},{b},{c})");
                }
            }
        }
    }

    #[test]
    fn full_adder_internal_wiring() {
        let full = FullAdder::new("FA");
        assert_eq!(full.net.len(), 3);
        assert!(matches!(
            full.net.binding(full.second, Pin::A),
            Some(Binding::Connected(_))
        ));
        assert_eq!(full.net.binding(full.second, Pin::B), Some(Binding::Unbound));
        assert!(full.net.depends_on(full.or, full.first));
        assert_eq!(full.net.label(full.or), Some("FA_OR"));
    }

    #[test]
    fn byte_adder_known_sums() {
        let mut net = Network::new();
        let adder = net.eight_bit_adder("ADD8");
        for (a, b, expected) in [(170, 85, 255), (200, 100, 44), (0, 0, 0), (255, 1, 0)] {
            net.set_pin(adder, Pin::A, a).unwrap();
            net.set_pin(adder, Pin::B, b).unwrap();
            let out = net.output(adder, &mut ConstantProvider(0)).unwrap();
            assert_eq!(out, Output::Single(expected), "{a} + {b}");
        }
    }

    #[test]
    fn byte_adder_reads_operands_from_provider() {
        let mut net = Network::new();
        let adder = net.eight_bit_adder("ADD8");
        let mut provider = ScriptedProvider::new([200, 100]);
        assert_eq!(net.output(adder, &mut provider).unwrap(), Output::Single(44));
        assert_eq!(
            provider.asked(),
            &[
                ("ADD8".to_string(), "pinA".to_string()),
                ("ADD8".to_string(), "pinB".to_string())
            ]
        );

        let mut provider = ScriptedProvider::new([256, 0]);
        assert!(matches!(
            net.output(adder, &mut provider),
            Err(EvalError::OutOfRange { value: 256, max: 255, .. })
        ));
    }

    #[test]
    fn byte_adder_wraps_like_u8() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut net = Network::new();
        let adder = net.eight_bit_adder("ADD8");
        for _ in 0..64 {
            let a: u8 = rng.gen();
            let b: u8 = rng.gen();
            net.set_pin(adder, Pin::A, a).unwrap();
            net.set_pin(adder, Pin::B, b).unwrap();
            let out = net.output(adder, &mut ConstantProvider(0)).unwrap();
            assert_eq!(out, Output::Single(a.wrapping_add(b)), "{a} + {b}");
        }
    }

    #[test]
    fn adders_fed_by_upstream_gates() {
        // carry_in comes from a half adder's carry, pins from primitive gates
        let mut net = Network::new();
        let x = net.or("X");
        let y = net.and("Y");
        let h = net.half_adder("H");
        let full = net.full_adder("FA");
        net.connect(x, full, Channel::Single, Target::NextAvailable).unwrap();
        net.connect(y, full, Channel::Single, Target::NextAvailable).unwrap();
        net.connect(h, full, Channel::Secondary, Target::CarryIn).unwrap();
        for gate in [x, y, h] {
            net.set_pin(gate, Pin::A, 1).unwrap();
            net.set_pin(gate, Pin::B, 1).unwrap();
        }
        assert_eq!(pair(&mut net, full), (1, 1));
        net.set_pin(h, Pin::A, 0).unwrap();
        assert_eq!(pair(&mut net, full), (0, 1));
    }

    #[test]
    fn stages_chain_through_carry() {
        let adder = EightBitAdder::new("ADD8");
        assert_eq!(adder.stages.len(), ADDER_BITS);
        assert_eq!(adder.net.kind(adder.stages[0]), Some(GateKind::HalfAdder));
        for window in adder.stages.windows(2) {
            assert!(matches!(
                adder.net.binding(window[1], Pin::CarryIn),
                Some(Binding::Connected(_))
            ));
            assert!(adder.net.depends_on(window[1], window[0]));
        }
        assert_eq!(adder.net.label(adder.stages[7]), Some("ADD8_FA8"));
    }
}
