// Shared between fuzz targets: turns structured fuzz input into an argument tree.

use std::sync::Arc;

use prog_sizes::types::Type;
use prog_sizes::Arg;

const TOKENS: &[&str] = &[
    "f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "parent", "elem", "syscall", "s0", "s1", "s2",
];

#[derive(Debug, arbitrary::Arbitrary)]
pub enum FuzzNode {
    Int { size: u8 },
    Buffer { len: u8 },
    Array { elem: u8, count: u8 },
    Struct { name: u8, fields: Vec<FuzzNode> },
    Union { name: u8, option: Box<FuzzNode> },
    Ptr { target: Option<Box<FuzzNode>> },
    Vma { size: u16 },
    Len { path: Vec<u8>, bit_size: u8, offset: bool },
}

pub struct Builder {
    counter: usize,
}

impl Builder {
    pub fn new() -> Self {
        Builder { counter: 0 }
    }

    fn field(&mut self) -> String {
        let name = format!("f{}", self.counter % 8);
        self.counter += 1;
        name
    }

    pub fn build_all(&mut self, nodes: &[FuzzNode]) -> Vec<Arg> {
        nodes.iter().take(16).map(|n| self.build(n, 0)).collect()
    }

    fn build(&mut self, node: &FuzzNode, depth: usize) -> Arg {
        let field = self.field();
        if depth > 6 {
            return Arg::constant(Arc::new(Type::int(field, 4)), 0);
        }
        match node {
            FuzzNode::Int { size } => Arg::constant(Arc::new(Type::int(field, 1 << (size % 4))), 0),
            FuzzNode::Buffer { len } => Arg::data(Arc::new(Type::buffer(field, None)), vec![0; *len as usize]),
            FuzzNode::Array { elem, count } => {
                let elem = Type::int("", 1 << (elem % 4));
                let inner = (0..count % 16).map(|_| Arg::constant(Arc::new(elem.clone()), 0)).collect();
                Arg::group(Arc::new(Type::array(field, elem)), inner)
            }
            FuzzNode::Struct { name, fields } => {
                let inner = fields.iter().take(8).map(|f| self.build(f, depth + 1)).collect();
                let ty = Type::structure(format!("s{}[x]", name % 3), field);
                Arg::group(Arc::new(ty), inner)
            }
            FuzzNode::Union { name, option } => {
                let option = self.build(option, depth + 1);
                Arg::union(Arc::new(Type::union(format!("s{}", name % 3), field)), option, 0)
            }
            FuzzNode::Ptr { target } => {
                let res = target.as_deref().map(|t| self.build(t, depth + 1));
                Arg::pointer(Arc::new(Type::ptr(field)), res)
            }
            FuzzNode::Vma { size } => Arg::vma(Arc::new(Type::vma(field)), *size as u64),
            FuzzNode::Len { path, bit_size, offset } => {
                let mut tokens: Vec<&str> = path.iter().take(4).map(|t| TOKENS[*t as usize % TOKENS.len()]).collect();
                if tokens.is_empty() {
                    tokens.push("f0");
                }
                let ty = Type::len(field, 8, &tokens, *bit_size as u64 % 65, *offset);
                Arg::constant(Arc::new(ty), 0)
            }
        }
    }
}
