use bringup_core::error::{CoreError, Severity};

/// Route a `CoreError` to the tracing level matching its severity.
pub fn log_core_error(err: CoreError) {
    match err.severity {
        Severity::Debug => tracing::debug!(domain = ?err.domain, kind = ?err.kind, "{err}"),
        Severity::Info => tracing::info!(domain = ?err.domain, kind = ?err.kind, "{err}"),
        Severity::Warn => tracing::warn!(domain = ?err.domain, kind = ?err.kind, "{err}"),
        Severity::Error => tracing::error!(domain = ?err.domain, kind = ?err.kind, "{err}"),
    }
}
