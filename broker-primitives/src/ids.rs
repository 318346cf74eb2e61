//! Identifier newtypes scoping coordination state to a project and a session.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Error;

const MAX_ID_LEN: usize = 256;

fn validate(label: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::InvalidId {
            label,
            reason: "must not be empty".into(),
        });
    }
    if value.len() > MAX_ID_LEN {
        return Err(Error::InvalidId {
            label,
            reason: format!("length must be <= {MAX_ID_LEN}"),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier after validating its format.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidId`] if the supplied value is empty or
            /// exceeds the maximum supported length.
            pub fn new(value: impl Into<String>) -> Result<Self, Error> {
                let value = value.into();
                validate($label, &value)?;
                Ok(Self(value))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// A top-level namespace isolating one coordination context from another.
    ///
    /// Keys belonging to different projects never alias: every store key is
    /// prefixed `project:{project_id}:...`.
    ProjectId,
    "project_id"
);

string_id!(
    /// An agent's identity within a project, unique among currently active agents.
    ///
    /// Conventionally `task-{task_id}`, but the broker treats it as an opaque
    /// client-chosen string.
    SessionName,
    "session_name"
);

string_id!(
    /// The task identifier an agent was started to work on.
    TaskId,
    "task_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_identifiers() {
        assert!(matches!(
            ProjectId::new(""),
            Err(Error::InvalidId { label: "project_id", .. })
        ));
        assert!(matches!(
            SessionName::new(""),
            Err(Error::InvalidId { label: "session_name", .. })
        ));
    }

    #[test]
    fn accepts_conventional_session_name() {
        let id = SessionName::new("task-001").expect("valid session name");
        assert_eq!(id.as_str(), "task-001");
        assert_eq!(id.to_string(), "task-001");
    }

    #[test]
    fn rejects_oversized_identifier() {
        let huge = "a".repeat(MAX_ID_LEN + 1);
        assert!(matches!(
            TaskId::new(huge),
            Err(Error::InvalidId { label: "task_id", .. })
        ));
    }
}
