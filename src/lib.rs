//! Weather state for a watch face: maps condition codes to icons, persists the
//! latest snapshot between runs, and owns the decoded icon images.

pub mod condition;
pub mod config;
pub mod icon;
pub mod record;
pub mod storage;
pub mod store;

pub use condition::{resolve_icon, IconId};
pub use store::{IconSlot, Snapshot, StoreError, WeatherStore};
