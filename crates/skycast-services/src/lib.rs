//! Application services: fetch orchestration, app state, search debounce,
//! settings and the release check.

pub mod debounce;
pub mod orchestrator;
pub mod settings;
pub mod state;
pub mod update;

pub use debounce::Debouncer;
pub use orchestrator::{FetchOutcome, WeatherOrchestrator};
pub use settings::AppSettings;
pub use state::{AppState, Screen};
pub use update::{compare_versions, is_update_needed, ReleaseInfo, UpdateChecker, UpdateInfo};
