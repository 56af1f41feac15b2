//! Session history persistence.

mod store;

pub use store::HistoryStore;
