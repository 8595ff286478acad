pub mod db;
pub mod error;
mod migrations;
pub mod signals;
pub mod state;
pub mod types;

pub use error::SignalError;
pub use signals::patterns::SignalCategory;
pub use signals::scan::{ScanOrchestrator, ScanReport};
pub use signals::scoring::StrengthLevel;
