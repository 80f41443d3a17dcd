//! Systems - logic that operates on components

mod lifecycle;
mod machine_safety;

pub use lifecycle::*;
pub use machine_safety::*;
