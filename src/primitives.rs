use std::sync::Arc;

use crate::types::{Type, TypeKind};

// --- Node identity ----------------------------------------------------------

/// Identity of an argument node for the lifetime of one pass.
///
/// Derived from the node's address, so it is only meaningful while the tree
/// is not restructured. Resolution never restructures, it only rewrites scalar
/// values in place.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ArgId(usize);

impl ArgId {
    pub fn of(arg: &Arg) -> Self {
        ArgId(arg as *const Arg as usize)
    }
}

// --- Argument tree ----------------------------------------------------------

/// Scalar argument: integers, flags and length fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstArg {
    pub ty: Arc<Type>,
    pub val: u64,
}

/// Byte buffer argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArg {
    pub ty: Arc<Type>,
    pub data: Vec<u8>,
}

/// Struct or array argument with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupArg {
    pub ty: Arc<Type>,
    pub inner: Vec<Arg>,
}

/// Union argument holding the active option only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionArg {
    pub ty: Arc<Type>,
    pub option: Box<Arg>,
    pub index: usize,
}

/// Pointer to a modelled argument (`res`) or to a raw memory region (`vma_size`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerArg {
    pub ty: Arc<Type>,
    pub res: Option<Box<Arg>>,
    pub vma_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Const(ConstArg),
    Data(DataArg),
    Group(GroupArg),
    Union(UnionArg),
    Pointer(PointerArg),
}

impl Arg {
    pub fn constant(ty: Arc<Type>, val: u64) -> Self {
        Arg::Const(ConstArg { ty, val })
    }

    pub fn data(ty: Arc<Type>, data: Vec<u8>) -> Self {
        Arg::Data(DataArg { ty, data })
    }

    pub fn group(ty: Arc<Type>, inner: Vec<Arg>) -> Self {
        Arg::Group(GroupArg { ty, inner })
    }

    pub fn union(ty: Arc<Type>, option: Arg, index: usize) -> Self {
        Arg::Union(UnionArg { ty, option: Box::new(option), index })
    }

    pub fn pointer(ty: Arc<Type>, res: Option<Arg>) -> Self {
        Arg::Pointer(PointerArg { ty, res: res.map(Box::new), vma_size: 0 })
    }

    pub fn vma(ty: Arc<Type>, vma_size: u64) -> Self {
        Arg::Pointer(PointerArg { ty, res: None, vma_size })
    }

    pub fn ty(&self) -> &Type {
        match self {
            Arg::Const(a) => &a.ty,
            Arg::Data(a) => &a.ty,
            Arg::Group(a) => &a.ty,
            Arg::Union(a) => &a.ty,
            Arg::Pointer(a) => &a.ty,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.ty().field_name
    }

    /// Size of the argument in bytes.
    ///
    /// Bitfield group members other than the last one do not count; the last
    /// member carries the size of the whole storage unit.
    pub fn size(&self) -> u64 {
        match self {
            Arg::Const(a) => a.ty.byte_size(),
            Arg::Data(a) => a.data.len() as u64,
            Arg::Group(a) => a
                .inner
                .iter()
                .filter(|field| !field.ty().bitfield_middle)
                .map(Arg::size)
                .sum(),
            Arg::Union(a) => a.option.size(),
            Arg::Pointer(a) => a.ty.byte_size(),
        }
    }

    /// Follows pointers to the pointee. `None` for an absent optional pointee.
    /// Memory-region pointers are returned as is.
    pub fn inner_arg(&self) -> Option<&Arg> {
        match self {
            Arg::Pointer(p) if self.is_ptr() => p.res.as_deref().and_then(Arg::inner_arg),
            _ => Some(self),
        }
    }

    pub fn inner_arg_mut(&mut self) -> Option<&mut Arg> {
        if !self.is_ptr() {
            return Some(self);
        }
        match self {
            Arg::Pointer(p) => p.res.as_deref_mut().and_then(Arg::inner_arg_mut),
            _ => None,
        }
    }

    fn is_ptr(&self) -> bool {
        matches!(self, Arg::Pointer(p) if matches!(p.ty.kind, TypeKind::Ptr))
    }

    /// Structural children: group fields, or the active union option.
    pub fn children(&self) -> Option<&[Arg]> {
        match self {
            Arg::Group(g) => Some(&g.inner),
            Arg::Union(u) => Some(std::slice::from_ref(&*u.option)),
            _ => None,
        }
    }

    /// Visits this argument and everything nested in it, pointees included.
    pub fn for_each_sub_arg<'a>(&'a self, f: &mut impl FnMut(&'a Arg)) {
        f(self);
        match self {
            Arg::Group(g) => g.inner.iter().for_each(|a| a.for_each_sub_arg(f)),
            Arg::Union(u) => u.option.for_each_sub_arg(f),
            Arg::Pointer(PointerArg { res: Some(res), .. }) => res.for_each_sub_arg(f),
            _ => {}
        }
    }

    pub fn for_each_sub_arg_mut(&mut self, f: &mut impl FnMut(&mut Arg)) {
        f(self);
        match self {
            Arg::Group(g) => g.inner.iter_mut().for_each(|a| a.for_each_sub_arg_mut(f)),
            Arg::Union(u) => u.option.for_each_sub_arg_mut(f),
            Arg::Pointer(PointerArg { res: Some(res), .. }) => res.for_each_sub_arg_mut(f),
            _ => {}
        }
    }
}

// --- Calls and programs -----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Call { name: name.into(), args }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prog {
    pub calls: Vec<Call>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(t: Type) -> Arc<Type> {
        Arc::new(t)
    }

    #[test]
    fn test_struct_size_skips_bitfield_middles() {
        let s = Arg::group(
            ty(Type::structure("s", "s")),
            vec![
                Arg::constant(ty(Type::int("a", 4).bitfield(3, true)), 0),
                Arg::constant(ty(Type::int("b", 4).bitfield(5, false)), 0),
                Arg::constant(ty(Type::int("c", 2)), 0),
            ],
        );
        assert_eq!(s.size(), 6);
    }

    #[test]
    fn test_union_size_is_active_option() {
        let u = Arg::union(ty(Type::union("u", "u")), Arg::data(ty(Type::buffer("b", None)), vec![0; 13]), 1);
        assert_eq!(u.size(), 13);
    }

    #[test]
    fn test_inner_arg_peels_pointers_but_not_vma() {
        let target = Arg::constant(ty(Type::int("x", 8)), 7);
        let p = Arg::pointer(ty(Type::ptr("p")), Some(Arg::pointer(ty(Type::ptr("pp")), Some(target.clone()))));
        assert_eq!(p.inner_arg(), Some(&target));

        let absent = Arg::pointer(ty(Type::ptr("p")), None);
        assert_eq!(absent.inner_arg(), None);

        let vma = Arg::vma(ty(Type::vma("v")), 4096);
        assert_eq!(vma.inner_arg(), Some(&vma));
    }

    #[test]
    fn test_for_each_sub_arg_reaches_pointees() {
        let arg = Arg::group(
            ty(Type::structure("s", "s")),
            vec![Arg::pointer(ty(Type::ptr("p")), Some(Arg::constant(ty(Type::int("x", 4)), 1)))],
        );
        let mut names = Vec::new();
        arg.for_each_sub_arg(&mut |a| names.push(a.field_name().to_string()));
        assert_eq!(names, vec!["s", "p", "x"]);
    }
}
