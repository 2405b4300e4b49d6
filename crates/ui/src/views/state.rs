use services::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    NotReady,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NotReady => "Answer every flip before submitting.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<&ValidationError> for ViewError {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::NotReady => Self::NotReady,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_result<T>(result: Result<T, ViewError>) -> ViewState<T> {
    match result {
        Ok(value) => ViewState::Ready(value),
        Err(err) => ViewState::Error(err),
    }
}
