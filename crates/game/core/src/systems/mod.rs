//! Per-tick systems that run outside the activity scheduler.

pub mod dead;
pub mod inventory;
pub mod stats;

pub use dead::{DeathReport, dead_cleanup};
pub use inventory::InventoryError;
pub use stats::{equipment_changed, inventory_changed};
