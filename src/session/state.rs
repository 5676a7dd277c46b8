use std::fmt;

/// The top-level section on screen. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Setup,
    Loading,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    AnalysisStarted,
    AnalysisSucceeded,
    AnalysisFailed,
    AnalysisCancelled,
    Reset,
    ReportLoaded,
}

impl UiState {
    /// Next state for `event`, or `None` when the event is not valid here.
    pub fn transition(self, event: UiEvent) -> Option<Self> {
        use UiEvent::*;
        use UiState::*;

        match (self, event) {
            (_, Reset) => Some(Setup),
            (_, ReportLoaded) => Some(Results),
            (Setup, AnalysisStarted) => Some(Loading),
            (Loading, AnalysisSucceeded) => Some(Results),
            (Loading, AnalysisFailed | AnalysisCancelled) => Some(Setup),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Loading => "loading",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_lifecycle() {
        let loading = UiState::Setup.transition(UiEvent::AnalysisStarted).unwrap();
        assert_eq!(loading, UiState::Loading);
        assert_eq!(
            loading.transition(UiEvent::AnalysisSucceeded),
            Some(UiState::Results)
        );
        assert_eq!(loading.transition(UiEvent::AnalysisFailed), Some(UiState::Setup));
        assert_eq!(
            loading.transition(UiEvent::AnalysisCancelled),
            Some(UiState::Setup)
        );
    }

    #[test]
    fn reset_and_upload_are_accepted_everywhere() {
        for state in [UiState::Setup, UiState::Loading, UiState::Results] {
            assert_eq!(state.transition(UiEvent::Reset), Some(UiState::Setup));
            assert_eq!(state.transition(UiEvent::ReportLoaded), Some(UiState::Results));
        }
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        assert_eq!(UiState::Results.transition(UiEvent::AnalysisStarted), None);
        assert_eq!(UiState::Loading.transition(UiEvent::AnalysisStarted), None);
        assert_eq!(UiState::Setup.transition(UiEvent::AnalysisSucceeded), None);
        assert_eq!(UiState::Results.transition(UiEvent::AnalysisFailed), None);
    }
}
