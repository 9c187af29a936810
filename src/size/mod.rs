pub mod assign;
pub mod mutate;
pub mod parents;
pub mod resolve;


// Re-export the entry points so callers can use `crate::size::*`.
pub use assign::{assign_sizes_array, assign_sizes_call, assign_sizes_prog};
pub use mutate::{mutate_size, mutate_size_with, next_size_value};
pub use parents::ParentIndex;
pub use resolve::{compute_size, LenField, Resolver};
