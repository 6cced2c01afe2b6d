mod agent;
mod normalize;
mod sort;

pub use normalize::{normalize_batch, NormalizedRow, COLUMN_HEADERS};
pub use sort::sort_rows;

#[cfg(test)]
pub(crate) use agent::{resolve_agent, RESERVED_AGENT_FIELD};
