use std::error::Error;
use std::fmt;

/// The error returned when sending to an actor whose pump has already
/// stopped.
pub struct ActorClosedError;

impl fmt::Debug for ActorClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorClosedError").finish()
    }
}

impl fmt::Display for ActorClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the actor is closed")
    }
}

impl Error for ActorClosedError {}
