//! Transient child -> container index over one call's argument tree.

use std::collections::HashMap;

use crate::primitives::{Arg, ArgId};

/// Maps every nested argument to the struct, array or union that directly holds it.
///
/// Children are keyed by their pointer-peeled identity, so a field reached through
/// a pointer maps to the group holding the pointer. Inactive union options are
/// not part of the tree and never appear.
#[derive(Debug, Default)]
pub struct ParentIndex<'a> {
    parents: HashMap<ArgId, &'a Arg>,
}

impl<'a> ParentIndex<'a> {
    pub fn build(args: &'a [Arg]) -> Self {
        let mut parents = HashMap::new();
        for arg in args {
            arg.for_each_sub_arg(&mut |container: &'a Arg| {
                let Some(children) = container.children() else {
                    return;
                };
                for child in children.iter().filter_map(Arg::inner_arg) {
                    parents.insert(ArgId::of(child), container);
                }
            });
        }
        ParentIndex { parents }
    }

    pub fn parent(&self, arg: &Arg) -> Option<&'a Arg> {
        self.parents.get(&ArgId::of(arg)).copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn test_index_covers_nested_fields_and_union_option() {
        let args = vec![group(
            "outer",
            "o",
            vec![
                int("a", 4, 0),
                ptr("p", Some(group("inner", "i", vec![int("b", 2, 0)]))),
                union("u", "u", data("d", 3)),
            ],
        )];
        let index = ParentIndex::build(&args);
        // a, inner (behind p), union, b, d
        assert_eq!(index.len(), 5);

        let Arg::Group(outer) = &args[0] else { unreachable!() };
        let inner = outer.inner[1].inner_arg().unwrap();
        assert!(std::ptr::eq(index.parent(inner).unwrap(), &args[0]));
        assert!(index.parent(&outer.inner[1]).is_none());

        let Arg::Group(inner_group) = inner else { unreachable!() };
        assert!(std::ptr::eq(index.parent(&inner_group.inner[0]).unwrap(), inner));

        let Arg::Union(u) = &outer.inner[2] else { unreachable!() };
        assert!(std::ptr::eq(index.parent(&u.option).unwrap(), &outer.inner[2]));
    }

    #[test]
    fn test_top_level_args_have_no_parent() {
        let args = vec![int("a", 4, 0), data("b", 8)];
        let index = ParentIndex::build(&args);
        assert!(index.is_empty());
        assert!(index.parent(&args[0]).is_none());
    }
}
