pub mod filter;
pub mod summary;
