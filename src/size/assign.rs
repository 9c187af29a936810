//! Assigns every length field of a call from its resolved target.
//!
//! Assignment runs in two phases over the same tree: values are resolved
//! against a shared borrow (the parent index borrows the tree), then written
//! back through a mutable walk keyed by `ArgId`. Sizes never depend on length
//! values, so the split does not change the result.

use std::collections::{HashMap, HashSet};

use crate::error::SizeError;
use crate::primitives::{Arg, ArgId, Call, Prog};
use crate::sampler::Sampler;
use crate::size::parents::ParentIndex;
use crate::size::resolve::{LenField, Resolver};
use crate::types::SYSCALL_REF;

/// Assigns all length fields of `call`.
///
/// Pass a sampler when generating (paths through `elem` are evaluated), `None`
/// to re-resolve an existing program deterministically.
pub fn assign_sizes_call(call: &mut Call, sampler: Option<&mut dyn Sampler>) -> Result<(), SizeError> {
    assign_sizes_with(&mut call.args, None, sampler)
}

/// Assigns all length fields of every call in `prog`.
pub fn assign_sizes_prog(prog: &mut Prog, mut sampler: Option<&mut dyn Sampler>) -> Result<(), SizeError> {
    for call in &mut prog.calls {
        tracing::debug!(call = %call.name, "assigning sizes");
        assign_sizes_with(&mut call.args, None, sampler.as_deref_mut())?;
    }
    Ok(())
}

/// Assigns length fields of a top-level argument set.
///
/// With `autos`, only length fields whose ids are in the set are assigned, and
/// each assigned id is removed from it.
pub fn assign_sizes_array(
    args: &mut [Arg],
    autos: Option<&mut HashSet<ArgId>>,
    sampler: Option<&mut dyn Sampler>,
) -> Result<(), SizeError> {
    assign_sizes_with(args, autos, sampler)
}

fn assign_sizes_with<S: Sampler + ?Sized>(
    args: &mut [Arg],
    autos: Option<&mut HashSet<ArgId>>,
    sampler: Option<&mut S>,
) -> Result<(), SizeError> {
    let plan = plan_sizes(args, autos, sampler)?;
    apply_plan(args, &plan);
    Ok(())
}

/// Resolves the value of every length field in `args` without writing it.
fn plan_sizes<'a, S: Sampler + ?Sized>(
    args: &'a [Arg],
    autos: Option<&mut HashSet<ArgId>>,
    sampler: Option<&mut S>,
) -> Result<HashMap<ArgId, u64>, SizeError> {
    let mut assigner = Assigner {
        resolver: Resolver::new(ParentIndex::build(args), sampler),
        syscall_args: args,
        autos,
        plan: HashMap::new(),
    };
    assigner.assign_sizes(args)?;

    let mut groups = Vec::new();
    for arg in args {
        arg.for_each_sub_arg(&mut |a: &'a Arg| groups.extend(a.children()));
    }
    for siblings in groups {
        assigner.assign_sizes(siblings)?;
    }
    Ok(assigner.plan)
}

fn apply_plan(args: &mut [Arg], plan: &HashMap<ArgId, u64>) {
    if plan.is_empty() {
        return;
    }
    for arg in args.iter_mut() {
        arg.for_each_sub_arg_mut(&mut |a| {
            let id = ArgId::of(a);
            if let (Some(&val), Arg::Const(c)) = (plan.get(&id), a) {
                c.val = val;
            }
        });
    }
}

struct Assigner<'a, 's, S: Sampler + ?Sized> {
    resolver: Resolver<'a, 's, S>,
    syscall_args: &'a [Arg],
    autos: Option<&'s mut HashSet<ArgId>>,
    plan: HashMap<ArgId, u64>,
}

impl<'a, 's, S: Sampler + ?Sized> Assigner<'a, 's, S> {
    /// Assigns length fields found directly in the sibling list `args`.
    fn assign_sizes(&mut self, args: &'a [Arg]) -> Result<(), SizeError> {
        // Pointers to absent optional length fields need no value.
        for arg in args.iter().filter_map(Arg::inner_arg) {
            let Some(field) = LenField::new(arg) else {
                continue;
            };
            let id = ArgId::of(arg);
            if let Some(autos) = self.autos.as_deref_mut() {
                if !autos.remove(&id) {
                    continue;
                }
            }
            let value = match field.len.path.split_first() {
                Some((first, rest)) if first == SYSCALL_REF => {
                    self.resolver.resolve(&field, None, rest, self.syscall_args)?
                }
                _ => self.resolver.resolve(&field, Some(arg), &field.len.path, args)?,
            };
            if let Some(val) = value {
                tracing::debug!(field = field.name(), path = ?field.len.path, val, "assigned len");
                self.plan.insert(id, val);
            }
        }
        Ok(())
    }
}
