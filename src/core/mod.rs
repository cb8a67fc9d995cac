//! Core business logic: configuration, quotes, the quote cache and the allocation engine

pub mod allocation;
pub mod cache;
pub mod config;
pub mod log;
pub mod price;
pub mod quotes;
pub mod strategy;

// Re-export main types for cleaner imports
pub use allocation::{AccountPlan, Allocation, AllocationError, AllocationStatus, GroupAllocations};
pub use cache::{CacheError, QuoteCache};
pub use price::{CASH_SYMBOL, PriceProvider, Quote};
