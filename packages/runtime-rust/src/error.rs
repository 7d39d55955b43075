use schemaview_core::ViewError;

/// Errors returned by the view runtime.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("view '{view}': {source}")]
    View {
        view: String,
        #[source]
        source: ViewError,
    },
    #[error("unknown view: {id}")]
    UnknownView { id: String },
    #[error("view already mounted: {id}")]
    DuplicateView { id: String },
    #[error("invalid runtime config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("tracing subscriber: {reason}")]
    Telemetry { reason: String },
    #[error("preference store error: {0}")]
    Preferences(#[from] anyhow::Error),
}

impl RuntimeError {
    pub(crate) fn view(id: &str, source: ViewError) -> Self {
        Self::View {
            view: id.to_string(),
            source,
        }
    }
}
