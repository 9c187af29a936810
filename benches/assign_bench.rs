use criterion::{criterion_group, criterion_main, Criterion};
use prog_sizes::sampler::RandGen;
use prog_sizes::size::{assign_sizes_call, mutate_size};
use prog_sizes::testing::{random_call, SplitMix64};
use prog_sizes::Call;

fn calls(n: usize) -> Vec<Call> {
    let mut r = RandGen::new(SplitMix64::new(42));
    (0..n).map(|_| random_call(&mut r)).collect()
}

fn size_benchmarks(c: &mut Criterion) {
    let corpus = calls(64);

    c.bench_function("assign_sizes_generate", |b| {
        let mut r = RandGen::new(SplitMix64::new(1));
        b.iter(|| {
            for call in corpus.clone().iter_mut() {
                let _ = assign_sizes_call(call, Some(&mut r));
            }
        })
    });

    c.bench_function("assign_sizes_reresolve", |b| {
        b.iter(|| {
            for call in corpus.clone().iter_mut() {
                let _ = assign_sizes_call(call, None);
            }
        })
    });

    c.bench_function("mutate_size", |b| {
        let mut r = RandGen::new(SplitMix64::new(2));
        let mut call = corpus
            .iter()
            .find(|c| c.args.iter().any(|a| matches!(a, prog_sizes::Arg::Const(k) if k.ty.len_type().is_some())))
            .cloned()
            .unwrap_or_else(|| Call::new("empty", Vec::new()));
        let idx = call
            .args
            .iter()
            .position(|a| matches!(a, prog_sizes::Arg::Const(k) if k.ty.len_type().is_some()));
        b.iter(|| {
            if let Some(i) = idx {
                let _ = mutate_size(&mut r, &mut call.args, i);
            }
        })
    });
}

criterion_group!(benches, size_benchmarks);
criterion_main!(benches);
