pub mod allocation;
pub mod entry;
pub mod payload;
pub mod query;
