use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from its string form.
            #[inline]
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            /// Returns the string form of this id.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id! {
    /// Identity of a conversation, which doubles as the room key on the
    /// event channel.
    ConversationId
}

string_id! {
    /// Server-assigned identity of a message.
    MessageId
}

string_id! {
    /// Identity of the work item a conversation is attached to.
    WorkItemId
}

string_id! {
    /// Identity of a user.
    UserId
}
