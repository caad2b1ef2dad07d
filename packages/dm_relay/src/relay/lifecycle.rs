//! Per-connection lifecycle: Anonymous → Identified → Disconnected.

/// State of one transport session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Transport is up, no user id announced yet.
    #[default]
    Anonymous,
    /// Announced as `user_id`; present in the registry.
    Identified { user_id: String },
    /// Terminal. A new connection starts over at `Anonymous`.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("session is closed")]
    Closed,
    #[error("announce a user id before sending messages")]
    NotIdentified,
    #[error("user id is required")]
    EmptyUserId,
    #[error("cannot log out {requested}: this session is {announced}")]
    LogoutMismatch { announced: String, requested: String },
}

impl SessionState {
    /// Anonymous/Identified → Identified. Returns the previously announced id, if any.
    pub fn announce(&mut self, user_id: &str) -> Result<Option<String>, LifecycleError> {
        if user_id.trim().is_empty() {
            return Err(LifecycleError::EmptyUserId);
        }
        let previous = match self {
            SessionState::Disconnected => return Err(LifecycleError::Closed),
            SessionState::Anonymous => None,
            SessionState::Identified { user_id: current } => Some(std::mem::take(current)),
        };
        *self = SessionState::Identified {
            user_id: user_id.to_string(),
        };
        Ok(previous)
    }

    /// Identified → Disconnected, for the announced identity only.
    pub fn logout(&mut self, user_id: &str) -> Result<String, LifecycleError> {
        match self {
            SessionState::Disconnected => Err(LifecycleError::Closed),
            SessionState::Anonymous => Err(LifecycleError::NotIdentified),
            SessionState::Identified { user_id: announced } if announced.as_str() != user_id => {
                Err(LifecycleError::LogoutMismatch {
                    announced: announced.clone(),
                    requested: user_id.to_string(),
                })
            }
            SessionState::Identified { .. } => {
                *self = SessionState::Disconnected;
                Ok(user_id.to_string())
            }
        }
    }

    /// Transport closed. Returns the identity that was online, if any.
    pub fn disconnect(&mut self) -> Option<String> {
        match std::mem::replace(self, SessionState::Disconnected) {
            SessionState::Identified { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// The identity messages from this session are sent as.
    pub fn sender(&self) -> Result<&str, LifecycleError> {
        match self {
            SessionState::Identified { user_id } => Ok(user_id),
            SessionState::Anonymous => Err(LifecycleError::NotIdentified),
            SessionState::Disconnected => Err(LifecycleError::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Disconnected)
    }
}
