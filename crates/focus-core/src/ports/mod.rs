//! Store traits (ports)

pub mod durable_store;
pub mod fast_store;

pub use durable_store::DurableStore;
pub use fast_store::FastStore;

#[cfg(test)]
pub use durable_store::MockDurableStore;
#[cfg(test)]
pub use fast_store::MockFastStore;
