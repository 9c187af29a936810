//!
//! Test utilities: a deterministic RNG, a scripted sampler, argument tree
//! builders and a random generator of well-formed calls with length fields.

use std::collections::VecDeque;
use std::sync::Arc;

use rand_core::{impls, RngCore};

use crate::primitives::{Arg, Call};
use crate::sampler::Sampler;
use crate::types::{Type, ELEM_REF, PARENT_REF};

// --- Randomness -------------------------------------------------------------

/// Small seedable generator for reproducible tests.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        SplitMix64 { state: seed }
    }
}

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Sampler answering from queues, in call order.
///
/// `flips` answers `one_of`, `bin` and `n_out_of`; `values` answers `rand`,
/// `biased_rand` and `rand_range_int` (reduced into the requested range).
/// Exhausted queues answer `false` / 0.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSampler {
    pub flips: VecDeque<bool>,
    pub values: VecDeque<u64>,
    pub word: u64,
}

impl ScriptedSampler {
    pub fn new(flips: &[bool], values: &[u64]) -> Self {
        ScriptedSampler {
            flips: flips.iter().copied().collect(),
            values: values.iter().copied().collect(),
            word: 0,
        }
    }

    fn flip(&mut self) -> bool {
        self.flips.pop_front().unwrap_or(false)
    }

    fn value(&mut self) -> u64 {
        self.values.pop_front().unwrap_or(0)
    }
}

impl Sampler for ScriptedSampler {
    fn rand64(&mut self) -> u64 {
        self.word
    }

    fn rand(&mut self, n: u64) -> u64 {
        self.value() % n.max(1)
    }

    fn one_of(&mut self, _n: u64) -> bool {
        self.flip()
    }

    fn bin(&mut self) -> bool {
        self.flip()
    }

    fn n_out_of(&mut self, _n: u64, _out_of: u64) -> bool {
        self.flip()
    }

    fn biased_rand(&mut self, n: u64, _k: u64) -> u64 {
        self.value().min(n.saturating_sub(1))
    }

    fn rand_range_int(&mut self, begin: u64, end: u64, _bit_size: u64) -> u64 {
        let span = end.wrapping_sub(begin).wrapping_add(1);
        let v = self.value();
        if span == 0 {
            return v;
        }
        begin.wrapping_add(v % span)
    }
}

#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

// --- Tree builders ----------------------------------------------------------

pub fn int(field: &str, size: u64, val: u64) -> Arg {
    Arg::constant(Arc::new(Type::int(field, size)), val)
}

pub fn bitfield(field: &str, size: u64, bits: u64, middle: bool) -> Arg {
    Arg::constant(Arc::new(Type::int(field, size).bitfield(bits, middle)), 0)
}

/// Length field with value 0.
pub fn len(field: &str, size: u64, path: &[&str], bit_size: u64, offset: bool) -> Arg {
    Arg::constant(Arc::new(Type::len(field, size, path, bit_size, offset)), 0)
}

/// Zero-filled buffer of `n` bytes.
pub fn data(field: &str, n: usize) -> Arg {
    Arg::data(Arc::new(Type::buffer(field, None)), vec![0; n])
}

pub fn group(type_name: &str, field: &str, inner: Vec<Arg>) -> Arg {
    Arg::group(Arc::new(Type::structure(type_name, field)), inner)
}

/// Array of `count` fixed-size integers of `elem_size` bytes.
pub fn int_array(field: &str, elem_size: u64, count: usize) -> Arg {
    let elem = Type::int("", elem_size);
    let inner = (0..count).map(|_| Arg::constant(Arc::new(elem.clone()), 0)).collect();
    Arg::group(Arc::new(Type::array(field, elem)), inner)
}

pub fn union(type_name: &str, field: &str, option: Arg) -> Arg {
    Arg::union(Arc::new(Type::union(type_name, field)), option, 0)
}

pub fn ptr(field: &str, res: Option<Arg>) -> Arg {
    Arg::pointer(Arc::new(Type::ptr(field)), res)
}

pub fn vma(field: &str, size: u64) -> Arg {
    Arg::vma(Arc::new(Type::vma(field)), size)
}

/// Finds the argument at the end of a field-name path, following pointers.
pub fn field<'a>(args: &'a [Arg], path: &[&str]) -> &'a Arg {
    let (first, rest) = path.split_first().expect("empty field path");
    let arg = args
        .iter()
        .filter_map(Arg::inner_arg)
        .find(|a| a.field_name() == *first)
        .unwrap_or_else(|| panic!("no field {first:?}"));
    if rest.is_empty() {
        return arg;
    }
    field(arg.children().expect("not a group"), rest)
}

/// Value of the scalar at `path`.
pub fn value(args: &[Arg], path: &[&str]) -> u64 {
    match field(args, path) {
        Arg::Const(c) => c.val,
        other => panic!("{:?} is not a scalar", other.field_name()),
    }
}

/// All length fields in walk order, as (field name, value).
pub fn len_values(args: &[Arg]) -> Vec<(String, u64)> {
    let mut out = Vec::new();
    for arg in args {
        arg.for_each_sub_arg(&mut |a| {
            if let Arg::Const(c) = a {
                if c.ty.len_type().is_some() {
                    out.push((c.ty.field_name.clone(), c.val));
                }
            }
        });
    }
    out
}

// --- Random well-formed calls -----------------------------------------------

/// Generates a call whose length paths all resolve.
///
/// Lengths refer to siblings (optionally into a sibling struct, or to a random
/// element of a sibling array or buffer), to `parent`, or to an enclosing type
/// by its template-stripped name.
pub fn random_call(r: &mut dyn Sampler) -> Call {
    let mut tree = TreeGen { r, counter: 0 };
    let args = tree.fields(0, &[]);
    Call::new("test$sizes", args)
}

struct TreeGen<'r> {
    r: &'r mut dyn Sampler,
    counter: usize,
}

impl TreeGen<'_> {
    fn name(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}{}", self.counter)
    }

    fn pick<'v, T>(&mut self, items: &'v [T]) -> &'v T {
        &items[self.r.rand(items.len() as u64) as usize]
    }

    /// A sibling list; `ancestors` are the stripped type names of enclosing groups,
    /// innermost first.
    fn fields(&mut self, depth: usize, ancestors: &[String]) -> Vec<Arg> {
        let count = 1 + self.r.rand(4);
        let mut args: Vec<Arg> = (0..count).map(|_| self.value(depth, ancestors)).collect();

        for _ in 0..self.r.rand(3) {
            let name = self.name("len");
            let bit_size = *self.pick(&[0u64, 8, 16, 32]);
            let target = self.pick(&args).field_name().to_string();
            let target_arg = args.iter().find(|a| a.field_name() == target).and_then(Arg::inner_arg);
            let mut offset = false;
            let path: Vec<String> = match self.r.rand(5) {
                0 if !ancestors.is_empty() => vec![PARENT_REF.to_string()],
                1 if !ancestors.is_empty() => vec![self.pick(ancestors).clone()],
                2 => match target_arg {
                    Some(Arg::Group(g)) if !g.inner.is_empty() && g.ty.len_type().is_none() => {
                        let elem = match g.ty.kind {
                            crate::types::TypeKind::Array { .. } => ELEM_REF.to_string(),
                            _ => g.inner[0].field_name().to_string(),
                        };
                        vec![target, elem]
                    }
                    Some(Arg::Data(_)) => vec![target, ELEM_REF.to_string()],
                    _ => vec![target],
                },
                _ => {
                    offset = self.r.one_of(4);
                    vec![target]
                }
            };
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            let size = *self.pick(&[1u64, 2, 4, 8]);
            let at = self.r.rand(args.len() as u64 + 1) as usize;
            args.insert(at, len(&name, size, &path, bit_size, offset));
        }
        args
    }

    fn value(&mut self, depth: usize, ancestors: &[String]) -> Arg {
        let field = self.name("f");
        let kinds = if depth < 2 { 6 } else { 3 };
        match self.r.rand(kinds) {
            0 => int(&field, *self.pick(&[1u64, 2, 4, 8]), 0),
            1 => data(&field, self.r.rand(17) as usize),
            2 => int_array(&field, *self.pick(&[1u64, 2, 4]), self.r.rand(6) as usize),
            3 => self.structure(&field, depth, ancestors),
            4 => {
                let type_name = self.name("un");
                let mut inner = vec![type_name.clone()];
                inner.extend_from_slice(ancestors);
                let option = if self.r.bin() {
                    self.structure("opt", depth + 1, &inner)
                } else {
                    data("opt", self.r.rand(9) as usize)
                };
                union(&type_name, &field, option)
            }
            _ => {
                let pointee = if self.r.one_of(4) {
                    None
                } else {
                    Some(self.structure("", depth + 1, ancestors))
                };
                ptr(&field, pointee)
            }
        }
    }

    fn structure(&mut self, field: &str, depth: usize, ancestors: &[String]) -> Arg {
        let base = self.name("st");
        let mut inner = vec![base.clone()];
        inner.extend_from_slice(ancestors);
        let fields = self.fields(depth + 1, &inner);
        group(&format!("{base}[int32]"), field, fields)
    }
}
