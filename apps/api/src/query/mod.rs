pub mod filter;
pub mod page;

pub use filter::Query;
pub use page::{facet_counts, PageInfo, PageRequest};
