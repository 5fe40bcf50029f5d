pub mod config;
pub mod error;
pub mod stage;
pub mod types;

pub use config::AppConfig;
pub use error::{DashboardError, DashboardResult};
pub use stage::Stage;
pub use types::{Campaign, Dataset, Session, Timeline};
