//!
//! Type descriptions attached to every argument node.
//!
//! A `Type` is shared (via `Arc`) by all arguments generated from it. Only the
//! parts of a syscall description that size resolution needs are modelled here:
//! names, declared byte size, bitfield packing and the kind of the node.

use crate::error::SizeError;

/// Path keyword: resolve against the call's full top-level argument list.
pub const SYSCALL_REF: &str = "syscall";
/// Path keyword: the immediate container of the current position.
pub const PARENT_REF: &str = "parent";
/// Path keyword: an arbitrary element of a sequence (or bit offset inside a buffer).
pub const ELEM_REF: &str = "elem";

/// Length semantics carried by a length scalar.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LenType {
    /// Reference path, first token first.
    pub path: Vec<String>,
    /// Unit of the value in bits. 0 means bytes (or element count for arrays).
    #[serde(default)]
    pub bit_size: u64,
    /// Report the byte offset of the target instead of its size.
    #[serde(default)]
    pub offset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Plain integer or flags scalar.
    Int,
    /// Scalar whose value is the size/offset/count of another field.
    Len(LenType),
    /// Pointer to unmodelled memory; the extent lives on the argument.
    Vma,
    /// Byte buffer.
    Buffer,
    /// Pointer to a modelled argument.
    Ptr,
    /// Fixed-layout record.
    Struct,
    /// Tagged choice.
    Union,
    /// Sequence of `elem`.
    Array { elem: Box<Type> },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Type {
    /// Declared type name. Template instantiations look like `foo[bar]`.
    pub name: String,
    /// Name of the field within its container, empty for unnamed elements.
    #[serde(default)]
    pub field_name: String,
    /// Declared byte size, `None` for variable-length types.
    #[serde(default)]
    pub size: Option<u64>,
    /// Width of a bitfield in bits, 0 if the field is not a bitfield.
    #[serde(default)]
    pub bitfield_len: u64,
    /// Field shares storage with the following field of the same bitfield group.
    #[serde(default)]
    pub bitfield_middle: bool,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl Type {
    pub fn new(name: impl Into<String>, field_name: impl Into<String>, size: Option<u64>, kind: TypeKind) -> Self {
        Type {
            name: name.into(),
            field_name: field_name.into(),
            size,
            bitfield_len: 0,
            bitfield_middle: false,
            kind,
        }
    }

    pub fn int(field_name: impl Into<String>, size: u64) -> Self {
        Self::new(format!("int{}", size * 8), field_name, Some(size), TypeKind::Int)
    }

    /// Length scalar of `size` bytes pointing at `path`.
    pub fn len(field_name: impl Into<String>, size: u64, path: &[&str], bit_size: u64, offset: bool) -> Self {
        let len = LenType {
            path: path.iter().map(|s| s.to_string()).collect(),
            bit_size,
            offset,
        };
        Self::new(format!("len{}", size * 8), field_name, Some(size), TypeKind::Len(len))
    }

    pub fn vma(field_name: impl Into<String>) -> Self {
        Self::new("vma", field_name, Some(8), TypeKind::Vma)
    }

    pub fn ptr(field_name: impl Into<String>) -> Self {
        Self::new("ptr", field_name, Some(8), TypeKind::Ptr)
    }

    pub fn buffer(field_name: impl Into<String>, size: Option<u64>) -> Self {
        Self::new("buffer", field_name, size, TypeKind::Buffer)
    }

    pub fn structure(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::new(name, field_name, None, TypeKind::Struct)
    }

    pub fn union(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::new(name, field_name, None, TypeKind::Union)
    }

    pub fn array(field_name: impl Into<String>, elem: Type) -> Self {
        let name = format!("array[{}]", elem.name);
        Self::new(name, field_name, None, TypeKind::Array { elem: Box::new(elem) })
    }

    /// Marks the type as a bitfield member of `bits` width.
    pub fn bitfield(mut self, bits: u64, middle: bool) -> Self {
        self.bitfield_len = bits;
        self.bitfield_middle = middle;
        self
    }

    /// Loads a type description from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, SizeError> {
        serde_json::from_str(text).map_err(|e| SizeError::Description(e.to_string()))
    }

    pub fn varlen(&self) -> bool {
        self.size.is_none()
    }

    /// Declared size in bytes, 0 for variable-length types.
    pub fn byte_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Width of the scalar's value in bits.
    pub fn type_bit_size(&self) -> u64 {
        if self.bitfield_len != 0 {
            self.bitfield_len
        } else {
            self.byte_size() * 8
        }
    }

    /// Type name with any template arguments (`foo[bar]` -> `foo`) stripped.
    pub fn template_name(&self) -> &str {
        match self.name.find('[') {
            Some(pos) => &self.name[..pos],
            None => &self.name,
        }
    }

    pub fn len_type(&self) -> Option<&LenType> {
        match &self.kind {
            TypeKind::Len(len) => Some(len),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name_strips_arguments() {
        assert_eq!(Type::structure("foo[bar]", "f").template_name(), "foo");
        assert_eq!(Type::structure("foo[bar[baz]]", "f").template_name(), "foo");
        assert_eq!(Type::structure("foo", "f").template_name(), "foo");
    }

    #[test]
    fn test_type_bit_size_prefers_bitfield_len() {
        assert_eq!(Type::int("a", 4).type_bit_size(), 32);
        assert_eq!(Type::int("a", 4).bitfield(3, true).type_bit_size(), 3);
    }

    #[test]
    fn test_from_json_len() {
        let ty = Type::from_json(
            r#"{"name":"len32","field_name":"n","size":4,"kind":"len","path":["parent","buf"],"bit_size":8}"#,
        )
        .unwrap();
        let len = ty.len_type().unwrap();
        assert_eq!(len.path, vec!["parent".to_string(), "buf".to_string()]);
        assert_eq!(len.bit_size, 8);
        assert!(!len.offset);
        assert_eq!(ty.size, Some(4));
    }

    #[test]
    fn test_from_json_rejects_unknown_kind() {
        let err = Type::from_json(r#"{"name":"x","kind":"bogus"}"#).unwrap_err();
        assert!(matches!(err, SizeError::Description(_)));
    }
}
