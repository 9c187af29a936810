//! Deliberate corruption of already-assigned length fields.

use crate::config::MutationConfig;
use crate::error::SizeError;
use crate::primitives::Arg;
use crate::sampler::Sampler;
use crate::size::resolve::LenField;
use crate::types::{LenType, TypeKind};

/// Mutates the length field at `siblings[index]` with the default config.
///
/// Returns `Ok(false)` when the field's target is a memory region or an array of
/// variable-length elements; the value is left untouched then.
pub fn mutate_size(sampler: &mut dyn Sampler, siblings: &mut [Arg], index: usize) -> Result<bool, SizeError> {
    mutate_size_with(sampler, siblings, index, &MutationConfig::default())
}

pub fn mutate_size_with(
    sampler: &mut dyn Sampler,
    siblings: &mut [Arg],
    index: usize,
    config: &MutationConfig,
) -> Result<bool, SizeError> {
    let len = siblings.len();
    let arg = siblings
        .get(index)
        .ok_or(SizeError::IndexOutOfRange { index, len })?;
    let field = arg
        .inner_arg()
        .and_then(LenField::new)
        .ok_or_else(|| SizeError::NotALength {
            type_name: arg.ty().name.clone(),
        })?;
    let bit_size = field.arg.ty().type_bit_size();
    let Some(elem_size) = granularity(field.len, siblings) else {
        tracing::trace!(field = field.name(), "len target has no fixed granularity, not mutating");
        return Ok(false);
    };

    let Some(Arg::Const(c)) = siblings[index].inner_arg_mut() else {
        return Err(SizeError::NotALength {
            type_name: siblings[index].ty().name.clone(),
        });
    };
    let old = c.val;
    c.val = next_size_value(sampler, old, elem_size, bit_size, config);
    tracing::debug!(field = %c.ty.field_name, old, new = c.val, elem_size, "mutated len");
    Ok(true)
}

/// Natural element size of the length's unit in bytes, `None` if it has none.
fn granularity(len: &LenType, siblings: &[Arg]) -> Option<u64> {
    let elem_size = len.bit_size / 8;
    if elem_size != 0 {
        return Some(elem_size);
    }
    // Only direct sibling references are refined.
    let [target] = len.path.as_slice() else {
        return Some(1);
    };
    let Some(inner) = siblings
        .iter()
        .find(|f| f.field_name() == target.as_str())
        .and_then(Arg::inner_arg)
    else {
        return Some(1);
    };
    match &inner.ty().kind {
        TypeKind::Vma => None,
        TypeKind::Array { elem } if elem.varlen() => None,
        TypeKind::Array { elem } => Some(elem.byte_size().max(1)),
        _ => Some(1),
    }
}

/// Picks a stressed value for a length currently holding `current`.
pub fn next_size_value(
    sampler: &mut dyn Sampler,
    current: u64,
    elem_size: u64,
    bit_size: u64,
    config: &MutationConfig,
) -> u64 {
    if sampler.one_of(config.random_value_odds) {
        return sampler.rand64();
    }
    if sampler.bin() {
        // Small adjustment to trigger missed size checks.
        if current != 0 && sampler.bin() {
            return sampler.rand_range_int(0, current - 1, bit_size);
        }
        return sampler.rand_range_int(
            current.wrapping_add(1),
            current.wrapping_add(config.perturb_window),
            bit_size,
        );
    }
    // Try to provoke int overflows.
    let mut max = u64::MAX;
    if sampler.one_of(3) {
        max = u32::MAX as u64;
        if sampler.one_of(2) {
            max = u16::MAX as u64;
            if sampler.one_of(2) {
                max = u8::MAX as u64;
            }
        }
    }
    let n = max / elem_size.max(1);
    let delta = config
        .overflow_delta_range
        .saturating_sub(1)
        .saturating_sub(sampler.biased_rand(config.overflow_delta_range, config.overflow_delta_bias));
    if elem_size == 1 || sampler.one_of(config.underflow_odds) {
        n.wrapping_sub(delta)
    } else {
        n.wrapping_add(delta)
    }
}
