use anyhow::Error;
use aquatrack::prelude::TrackerError;
use aquatrack_view::prelude::SessionError;

/// 2 when the user has to log in, 1 for everything else
pub fn exit_code(err: &Error) -> i32 {
    let session_failure = err
        .downcast_ref::<SessionError>()
        .is_some_and(SessionError::is_session_failure)
        || err
            .downcast_ref::<TrackerError>()
            .is_some_and(TrackerError::is_unauthorized);
    if session_failure { 2 } else { 1 }
}
