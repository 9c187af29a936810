#![no_main]

use libfuzzer_sys::fuzz_target;
use prog_sizes::sampler::RandGen;
use prog_sizes::size::mutate_size;
use prog_sizes::testing::SplitMix64;

mod tree;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    seed: u64,
    index: u8,
    rounds: u8,
    args: Vec<tree::FuzzNode>,
}

fuzz_target!(|input: FuzzInput| {
    let mut args = tree::Builder::new().build_all(&input.args);
    let mut r = RandGen::new(SplitMix64::new(input.seed));
    let before: Vec<u64> = args.iter().map(|a| a.size()).collect();

    for _ in 0..input.rounds % 8 {
        // Non-length targets are rejected with an error; nothing may panic.
        let _ = mutate_size(&mut r, &mut args, input.index as usize);
    }

    // Mutation only rewrites scalar values, never sizes.
    let after: Vec<u64> = args.iter().map(|a| a.size()).collect();
    assert_eq!(before, after);
});
