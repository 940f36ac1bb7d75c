pub mod cache;
pub mod insights;
pub mod movers;
pub mod picks;
pub mod sectors;
pub mod signals;
pub mod sqlite_store;

pub use cache::BarCache;
pub use insights::synthesize_insights;
pub use movers::enrich_movers;
pub use picks::select_picks;
pub use sectors::sector_momentum;
pub use signals::{run_momentum_scan, scan_patterns};
pub use sqlite_store::{EntityType, SqliteStore, StoredRow};
