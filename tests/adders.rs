use logic_gates::{
    Channel, ConnectError, ConstantProvider, FnProvider, GateKind, InputRequest, Network, Output,
    Pin, ProviderError, ScriptedProvider, Target, Width,
};

fn bits() -> [(u8, u8); 4] {
    [(0, 0), (0, 1), (1, 0), (1, 1)]
}

#[test]
fn primitive_gates_match_truth_tables() {
    let expected: [(GateKind, fn(bool, bool) -> bool); 5] = [
        (GateKind::And, |a, b| a && b),
        (GateKind::Nand, |a, b| !(a && b)),
        (GateKind::Or, |a, b| a || b),
        (GateKind::Nor, |a, b| !(a || b)),
        (GateKind::Xor, |a, b| a != b),
    ];
    let mut net = Network::new();
    for (kind, table) in expected {
        let gate = net.add_gate(kind, kind.as_str());
        for (a, b) in bits() {
            let mut provider = ScriptedProvider::new([i64::from(a), i64::from(b)]);
            let out = net.output(gate, &mut provider).unwrap();
            assert_eq!(out, Output::Single(table(a == 1, b == 1) as u8), "{kind}({a},{b})");
        }
    }
    let not = net.not("NOT");
    for a in 0..=1u8 {
        let out = net.output(not, &mut ConstantProvider(a.into())).unwrap();
        assert_eq!(out, Output::Single(1 - a));
    }
}

#[test]
fn half_adder_pairs() {
    let mut net = Network::new();
    let half = net.half_adder("HA");
    for (a, b) in bits() {
        net.set_pin(half, Pin::A, a).unwrap();
        net.set_pin(half, Pin::B, b).unwrap();
        let out = net.output(half, &mut ConstantProvider(0)).unwrap();
        assert_eq!(out, Output::Pair(a ^ b, a & b));
    }
}

#[test]
fn full_adder_examples() {
    let mut net = Network::new();
    let full = net.full_adder("FA");
    let mut run = |a: i64, b: i64, c: i64| {
        let mut provider = ScriptedProvider::new([a, b, c]);
        net.output(full, &mut provider).unwrap()
    };
    assert_eq!(run(1, 1, 1), Output::Pair(1, 1));
    assert_eq!(run(1, 0, 0), Output::Pair(1, 0));
    assert_eq!(run(0, 1, 1), Output::Pair(0, 1));
    assert_eq!(run(0, 0, 0), Output::Pair(0, 0));
}

#[test]
fn byte_adder_examples() {
    let mut net = Network::new();
    let adder = net.eight_bit_adder("ADD8");
    for (a, b, sum) in [(170, 85, 255), (200, 100, 44), (0, 0, 0), (255, 1, 0)] {
        let mut provider = FnProvider(move |req: &InputRequest<'_>| {
            assert_eq!(req.width, Width::Byte);
            Ok::<i64, ProviderError>(if req.pin == "pinA" { a } else { b })
        });
        assert_eq!(net.output(adder, &mut provider).unwrap(), Output::Single(sum));
    }
}

#[test]
fn ripple_of_half_adder_into_full_adder() {
    let mut net = Network::new();
    let low = net.half_adder("LOW");
    let high = net.full_adder("HIGH");
    net.connect(low, high, Channel::Secondary, Target::CarryIn).unwrap();
    // 2-bit add: 3 + 1 = 4 -> low sum 0, high sum 0, high carry 1
    net.set_pin(low, Pin::A, 1).unwrap();
    net.set_pin(low, Pin::B, 1).unwrap();
    net.set_pin(high, Pin::A, 1).unwrap();
    net.set_pin(high, Pin::B, 0).unwrap();
    let mut provider = ConstantProvider(0);
    assert_eq!(net.output(low, &mut provider).unwrap(), Output::Pair(0, 1));
    assert_eq!(net.output(high, &mut provider).unwrap(), Output::Pair(0, 1));
    assert_eq!(
        net.connect(low, high, Channel::Primary, Target::CarryIn),
        Err(ConnectError::SlotOccupied {
            gate: "HIGH".into(),
            pin: Pin::CarryIn
        })
    );
}
