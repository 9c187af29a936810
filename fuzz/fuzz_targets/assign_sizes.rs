#![no_main]

use libfuzzer_sys::fuzz_target;
use prog_sizes::sampler::RandGen;
use prog_sizes::size::assign_sizes_call;
use prog_sizes::testing::{len_values, SplitMix64};
use prog_sizes::Call;

mod tree;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    seed: u64,
    args: Vec<tree::FuzzNode>,
}

fuzz_target!(|input: FuzzInput| {
    let mut call = Call::new("fuzz", tree::Builder::new().build_all(&input.args));
    let mut r = RandGen::new(SplitMix64::new(input.seed));

    // Malformed paths must surface as errors, never as panics.
    if assign_sizes_call(&mut call, Some(&mut r)).is_err() {
        return;
    }
    let generated = len_values(&call.args);

    // Deterministic re-resolution stops at every point the generating pass sampled.
    assign_sizes_call(&mut call, None).expect("re-resolution of a resolvable call");
    assert_eq!(len_values(&call.args), generated);
});
