//! Refuse destructive operations aimed at the caller's own location.

use crate::address::PaneAddress;
use crate::error::ControllerError;

/// Fail with `SelfTargetRefused` when `target` is the caller's pane.
pub fn ensure_not_self_pane(
    own: Option<&PaneAddress>,
    target: &PaneAddress,
    operation: &str,
) -> Result<(), ControllerError> {
    if own == Some(target) {
        tracing::warn!(%target, operation, "refused self-targeting operation");
        return Err(ControllerError::SelfTargetRefused {
            target: target.to_string(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Fail with `SelfTargetRefused` when `session` contains the caller.
pub fn ensure_not_self_session(
    own_session: Option<&str>,
    session: &str,
    operation: &str,
) -> Result<(), ControllerError> {
    if own_session == Some(session) {
        tracing::warn!(session, operation, "refused self-targeting operation");
        return Err(ControllerError::SelfTargetRefused {
            target: session.to_string(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}
