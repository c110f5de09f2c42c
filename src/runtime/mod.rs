//! Engine runtime: the orchestrator loop and the handle that owns it.

pub mod facade;
pub mod orchestrator;
pub mod tasks;
pub mod view;


pub use facade::{EarningsSync, EarningsSyncBuilder};
pub use view::EarningsView;
