pub mod fetcher;
pub mod filter;
pub mod source;
