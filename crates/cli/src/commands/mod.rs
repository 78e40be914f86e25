//! Command implementations.

pub mod precache;

pub use precache::execute_precache;
