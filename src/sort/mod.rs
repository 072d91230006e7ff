//! Adaptive sorting driven by human judgments.

pub mod oracle;
pub mod driver;
pub mod consistency;

pub use oracle::{try_merge_sort, Comparison, JudgmentIndex};
pub use driver::{advance, advance_pool, SortDecision};
pub use consistency::{find_cycles, order_violations, PreferenceCycle};
