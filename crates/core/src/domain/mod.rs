pub mod record;

pub use record::{EnrichedRecord, ProductAttributes, SalesRecord};
