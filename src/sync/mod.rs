pub mod history;
pub mod reconciler;
pub mod snapshot;

pub use history::EventHistory;
pub use reconciler::{Applied, EventReconciler};
pub use snapshot::{derive_snapshot, SnapshotFetcher};
