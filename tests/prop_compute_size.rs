use proptest::prelude::*;
use prog_sizes::size::assign_sizes_call;
use prog_sizes::testing::{bitfield, data, int, int_array, len, value};
use prog_sizes::{Arg, Call};

fn bit_size() -> impl Strategy<Value = u64> {
    prop::sample::select(vec![0u64, 1, 8, 16, 32, 64])
}

/// Preceding sibling: (byte size, is a bitfield group member that is not the last).
fn preceding() -> impl Strategy<Value = Vec<(u64, bool)>> {
    prop::collection::vec((prop::sample::select(vec![1u64, 2, 4, 8]), any::<bool>()), 0..8)
}

proptest! {
    /// A plain length of a sibling buffer is its byte size scaled to the unit.
    #[test]
    fn prop_sibling_size_scaled(n in 0usize..4096, bits in bit_size()) {
        let mut call = Call::new("t", vec![len("n", 8, &["buf"], bits, false), data("buf", n)]);
        assign_sizes_call(&mut call, None).unwrap();
        let unit = if bits == 0 { 8 } else { bits };
        prop_assert_eq!(value(&call.args, &["n"]), n as u64 * 8 / unit);
    }

    /// An offset length is the sum of preceding non-middle bitfield siblings.
    #[test]
    fn prop_offset_sums_preceding(prev in preceding(), bits in bit_size()) {
        let mut args: Vec<Arg> = prev
            .iter()
            .enumerate()
            .map(|(i, (size, middle))| {
                let name = format!("f{i}");
                if *middle { bitfield(&name, *size, 1, true) } else { int(&name, *size, 0) }
            })
            .collect();
        let expected: u64 = prev.iter().filter(|(_, middle)| !middle).map(|(size, _)| size).sum();
        args.push(data("target", 3));
        args.push(len("off", 8, &["target"], bits, true));

        let mut call = Call::new("t", args);
        assign_sizes_call(&mut call, None).unwrap();
        let unit = if bits == 0 { 8 } else { bits };
        prop_assert_eq!(value(&call.args, &["off"]), expected * 8 / unit);
    }

    /// Array lengths count elements unless a unit is given.
    #[test]
    fn prop_array_count_or_bytes(count in 0usize..64, elem in prop::sample::select(vec![1u64, 2, 4, 8]), bits in bit_size()) {
        let mut call = Call::new("t", vec![int_array("arr", elem, count), len("n", 4, &["arr"], bits, false)]);
        assign_sizes_call(&mut call, None).unwrap();
        let expected = if bits == 0 { count as u64 } else { count as u64 * elem * 8 / bits };
        prop_assert_eq!(value(&call.args, &["n"]), expected);
    }
}
