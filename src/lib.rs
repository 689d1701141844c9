//! SquadSense ingestion and retrieval core.
//!
//! Wires configuration, logging and the [`squadsense_index`] pipeline over a
//! [`squadsense_memory`] chunk store.

pub mod bootstrap;
pub mod config;
pub mod logging;

pub use bootstrap::App;
pub use config::Config;
pub use squadsense_index as index;
pub use squadsense_memory as memory;
