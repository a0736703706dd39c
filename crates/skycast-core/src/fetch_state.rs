//! Weather fetch state machine.
//!
//! Transitions are driven by the orchestrator only; screens read the status.

/// Fetch status shown by the weather screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; previously cached data is on screen.
    Stale,
    /// Last fetch failed and there is nothing to show.
    Failed,
}

impl FetchStatus {
    /// True while a request is outstanding.
    pub fn is_loading(self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    /// True if the last completed transition ended in an error.
    pub fn is_error(self) -> bool {
        matches!(self, FetchStatus::Stale | FetchStatus::Failed)
    }

    /// State after a fetch is issued.
    pub fn on_start(self) -> Self {
        FetchStatus::Loading
    }

    /// State after a fetch is applied.
    pub fn on_success(self) -> Self {
        FetchStatus::Loaded
    }

    /// State after a fetch fails. `has_data` is whether anything (fresh or cached)
    /// remains available to display.
    pub fn on_failure(self, has_data: bool) -> Self {
        if has_data {
            FetchStatus::Stale
        } else {
            FetchStatus::Failed
        }
    }

    /// State after cached data is restored at start.
    pub fn on_restored(self) -> Self {
        FetchStatus::Loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_default() {
        assert_eq!(FetchStatus::default(), FetchStatus::Idle);
    }

    #[test]
    fn start_moves_to_loading_from_any_state() {
        for s in [
            FetchStatus::Idle,
            FetchStatus::Loaded,
            FetchStatus::Stale,
            FetchStatus::Failed,
        ] {
            assert!(s.on_start().is_loading());
        }
    }

    #[test]
    fn success_transitions_to_loaded() {
        assert_eq!(FetchStatus::Loading.on_success(), FetchStatus::Loaded);
    }

    #[test]
    fn failure_with_data_is_stale() {
        let s = FetchStatus::Loading.on_failure(true);
        assert_eq!(s, FetchStatus::Stale);
        assert!(s.is_error());
    }

    #[test]
    fn failure_without_data_is_failed() {
        let s = FetchStatus::Loading.on_failure(false);
        assert_eq!(s, FetchStatus::Failed);
        assert!(s.is_error());
    }

    #[test]
    fn loaded_is_not_an_error() {
        assert!(!FetchStatus::Loaded.is_error());
        assert!(!FetchStatus::Idle.is_loading());
    }
}
