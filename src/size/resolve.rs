//! Path resolution and size computation for a single length field.

use crate::error::SizeError;
use crate::primitives::Arg;
use crate::sampler::Sampler;
use crate::size::parents::ParentIndex;
use crate::types::{LenType, TypeKind, ELEM_REF, PARENT_REF};

/// A length scalar together with its length semantics.
#[derive(Debug, Clone, Copy)]
pub struct LenField<'a> {
    pub arg: &'a Arg,
    pub len: &'a LenType,
}

impl<'a> LenField<'a> {
    /// `None` unless `arg` is a scalar with a length type.
    pub fn new(arg: &'a Arg) -> Option<Self> {
        match arg {
            Arg::Const(c) => c.ty.len_type().map(|len| LenField { arg, len }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'a str {
        self.arg.field_name()
    }
}

/// Bit width a length counts in; 0 means bytes.
fn effective_bit_size(len: &LenType) -> u64 {
    if len.bit_size == 0 {
        8
    } else {
        len.bit_size
    }
}

/// Converts the size of `arg` (or `offset`, for offset lengths) into the unit `dst` counts in.
///
/// `offset` is `None` when the target was reached through an escape (`parent`,
/// an ancestor type name) and has no position within a sibling list.
pub fn compute_size(arg: &Arg, offset: Option<u64>, dst: &LenField<'_>) -> Result<u64, SizeError> {
    let bit_size = effective_bit_size(dst.len);
    if dst.len.offset {
        let offset = offset.ok_or_else(|| SizeError::MissingOffset {
            field: dst.name().to_string(),
        })?;
        return Ok(offset.wrapping_mul(8) / bit_size);
    }
    let size = match arg {
        Arg::Pointer(p) if matches!(p.ty.kind, TypeKind::Vma) => p.vma_size.wrapping_mul(8) / bit_size,
        // Array lengths without an explicit unit count elements.
        Arg::Group(g) if matches!(g.ty.kind, TypeKind::Array { .. }) && dst.len.bit_size == 0 => g.inner.len() as u64,
        Arg::Const(_) | Arg::Data(_) | Arg::Group(_) | Arg::Union(_) | Arg::Pointer(_) => {
            arg.size().wrapping_mul(8) / bit_size
        }
    };
    Ok(size)
}

/// Walks length paths over one call's argument tree.
///
/// With a sampler the resolver runs in generation mode and evaluates `elem`
/// paths; without one, those paths leave the length untouched.
pub struct Resolver<'a, 's, S: Sampler + ?Sized> {
    parents: ParentIndex<'a>,
    sampler: Option<&'s mut S>,
}

impl<'a, 's, S: Sampler + ?Sized> Resolver<'a, 's, S> {
    pub fn new(parents: ParentIndex<'a>, sampler: Option<&'s mut S>) -> Self {
        Resolver { parents, sampler }
    }

    pub fn parents(&self) -> &ParentIndex<'a> {
        &self.parents
    }

    /// Resolves `path` for `dst` starting in the sibling list `args`.
    ///
    /// `pos` is the node ancestor lookups start from; `None` for the call root.
    /// Returns `Ok(None)` when the path can only be evaluated in generation mode.
    ///
    /// An `elem` token picks a random entry of `args`. Offset lengths then get
    /// the offset of that entry within `args`, not the size of the whole list.
    pub fn resolve(
        &mut self,
        dst: &LenField<'a>,
        pos: Option<&'a Arg>,
        path: &[String],
        args: &'a [Arg],
    ) -> Result<Option<u64>, SizeError> {
        let (elem, rest) = path.split_first().ok_or_else(|| SizeError::EmptyPath {
            field: dst.name().to_string(),
        })?;
        tracing::trace!(field = dst.name(), token = %elem, remaining = rest.len(), "resolving len path");

        let mut offset = 0u64;
        for buf in args {
            if elem != buf.field_name() {
                if !buf.ty().bitfield_middle {
                    offset += buf.size();
                }
                continue;
            }
            let Some(buf) = buf.inner_arg() else {
                // Target is an absent optional pointee.
                return Ok(Some(0));
            };
            if rest.is_empty() {
                return compute_size(buf, Some(offset), dst).map(Some);
            }
            if matches!(buf, Arg::Data(_)) && rest.len() == 1 && rest[0] == ELEM_REF {
                return Ok(self.buffer_elem_offset(dst, buf, offset));
            }
            return self.descend(dst, buf, elem, rest);
        }

        if elem == PARENT_REF {
            let parent = pos
                .and_then(|p| self.parents.parent(p))
                .ok_or_else(|| SizeError::NoContainer {
                    field: dst.name().to_string(),
                    token: elem.clone(),
                })?;
            return self.resolve_escape(dst, parent, elem, rest);
        }

        if elem == ELEM_REF {
            let Some(sampler) = self.sampler.as_deref_mut() else {
                return Ok(None);
            };
            if args.is_empty() {
                return Ok(Some(0));
            }
            let idx = sampler.rand(args.len() as u64) as usize;
            if rest.is_empty() {
                // The element slot itself is measured, pointers included.
                let elem_offset = args[..idx]
                    .iter()
                    .filter(|a| !a.ty().bitfield_middle)
                    .map(Arg::size)
                    .sum();
                return compute_size(&args[idx], Some(elem_offset), dst).map(Some);
            }
            let Some(buf) = args[idx].inner_arg() else {
                return Ok(Some(0));
            };
            return self.descend(dst, buf, elem, rest);
        }

        let mut ancestor = pos.and_then(|p| self.parents.parent(p));
        while let Some(buf) = ancestor {
            if buf.ty().template_name() == elem.as_str() {
                return self.resolve_escape(dst, buf, elem, rest);
            }
            ancestor = self.parents.parent(buf);
        }

        Err(SizeError::UnresolvedReference {
            field: dst.name().to_string(),
            token: elem.clone(),
            pos_type: pos.map(|p| p.ty().name.clone()).unwrap_or_default(),
            pos_field: pos.map(|p| p.field_name().to_string()).unwrap_or_default(),
            siblings: args.iter().map(|a| a.field_name().to_string()).collect(),
        })
    }

    /// Continues from a container reached without a sibling position; offsets are lost.
    fn resolve_escape(
        &mut self,
        dst: &LenField<'a>,
        buf: &'a Arg,
        elem: &str,
        rest: &[String],
    ) -> Result<Option<u64>, SizeError> {
        if rest.is_empty() {
            return compute_size(buf, None, dst).map(Some);
        }
        self.descend(dst, buf, elem, rest)
    }

    fn descend(
        &mut self,
        dst: &LenField<'a>,
        buf: &'a Arg,
        elem: &str,
        rest: &[String],
    ) -> Result<Option<u64>, SizeError> {
        let children = buf.children().ok_or_else(|| SizeError::NotAGroup {
            field: dst.name().to_string(),
            token: elem.to_string(),
            type_name: buf.ty().name.clone(),
        })?;
        self.resolve(dst, Some(buf), rest, children)
    }

    /// Random bit-granular position inside a buffer, in units of the length's bit size.
    fn buffer_elem_offset(&mut self, dst: &LenField<'a>, buf: &Arg, offset: u64) -> Option<u64> {
        let sampler = self.sampler.as_deref_mut()?;
        let bit_size = effective_bit_size(dst.len);
        let sub = sampler.rand(buf.size().wrapping_mul(8) / bit_size);
        Some(offset.wrapping_mul(8) / bit_size + sub)
    }
}
