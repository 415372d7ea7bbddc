//! World management
//!
//! Lists the worlds installed under the worlds root and switches which one
//! the server loads.

mod manager;

pub use manager::{read_property, SwitchReport, WorldInfo, WorldManager, ALLOWLIST_FILE, PROPERTIES_FILE};
