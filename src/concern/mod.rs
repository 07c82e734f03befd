//! Contains the types for write concerns.

#[cfg(test)]
mod test;

use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

use crate::{
    error::{Error, Result},
    serde_util,
};

/// Specifies the level of acknowledgement requested from the server for write operations.
///
/// The write concern is passed through to the server unmodified as part of every batch.
///
/// See the documentation [here](https://www.mongodb.com/docs/manual/reference/write-concern/) for
/// more information about write concerns.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, TypedBuilder, Serialize)]
#[builder(field_defaults(default, setter(strip_option)))]
#[non_exhaustive]
pub struct WriteConcern {
    /// Requests acknowledgement that the operation has propagated to a specific number or variety
    /// of servers.
    pub w: Option<Acknowledgment>,

    /// Specifies a time limit for the write concern. If an operation has not propagated to the
    /// requested level within the time limit, a write concern error is reported.
    ///
    /// Note that a write concern error does not imply that the write would not have finished
    /// propagating if allowed more time to finish, and the server will not roll back the writes
    /// that occurred before the timeout was reached.
    #[serde(rename = "wtimeout")]
    #[serde(serialize_with = "serde_util::serialize_duration_option_as_int_millis")]
    pub w_timeout: Option<Duration>,

    /// Requests acknowledgement that the operation has propagated to the on-disk journal.
    #[serde(rename = "j")]
    pub journal: Option<bool>,
}

/// The type of the `w` field in a [`WriteConcern`](struct.WriteConcern.html).
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Acknowledgment {
    /// Requires acknowledgement that the write has reached the specified number of nodes.
    ///
    /// Note: specifying 0 here indicates that the write is unacknowledged. The server will not
    /// report counts or per-operation errors for such writes.
    Nodes(i32),
    /// Requires acknowledgement that the write has reached the majority of nodes.
    Majority,
    /// Requires acknowledgement according to the given custom write concern. See [here](https://www.mongodb.com/docs/manual/tutorial/configure-replica-set-tag-sets/#tag-sets-and-custom-write-concern-behavior)
    /// for more information.
    Custom(String),
}

impl Serialize for Acknowledgment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Acknowledgment::Majority => serializer.serialize_str("majority"),
            Acknowledgment::Nodes(n) => serializer.serialize_i32(*n),
            Acknowledgment::Custom(name) => serializer.serialize_str(name),
        }
    }
}

impl From<i32> for Acknowledgment {
    fn from(i: i32) -> Self {
        Acknowledgment::Nodes(i)
    }
}

impl From<&str> for Acknowledgment {
    fn from(s: &str) -> Self {
        if s == "majority" {
            Acknowledgment::Majority
        } else {
            Acknowledgment::Custom(s.to_string())
        }
    }
}

impl From<String> for Acknowledgment {
    fn from(s: String) -> Self {
        Acknowledgment::from(s.as_str())
    }
}

impl WriteConcern {
    /// A write concern requesting acknowledgement from a majority of nodes.
    pub fn majority() -> Self {
        Acknowledgment::Majority.into()
    }

    /// A write concern requesting no acknowledgement at all.
    pub fn unacknowledged() -> Self {
        Acknowledgment::Nodes(0).into()
    }

    /// Whether the server will acknowledge writes performed with this write concern.
    pub fn is_acknowledged(&self) -> bool {
        self.w != Some(Acknowledgment::Nodes(0)) || self.journal == Some(true)
    }

    /// Whether the write concern was created with no values specified. If true, the write concern
    /// is left out of commands so that the server default applies.
    pub fn is_empty(&self) -> bool {
        self.w.is_none() && self.w_timeout.is_none() && self.journal.is_none()
    }

    /// Validates the write concern. A write concern is invalid if the `w` field is 0 and the `j`
    /// field is `true`.
    pub fn validate(&self) -> Result<()> {
        if let Some(Acknowledgment::Nodes(i)) = self.w {
            if i < 0 {
                return Err(Error::invalid_operation(
                    "write concern `w` field cannot be negative integer",
                ));
            }
        }

        if self.w == Some(Acknowledgment::Nodes(0)) && self.journal == Some(true) {
            return Err(Error::invalid_operation(
                "write concern cannot have w=0 and j=true",
            ));
        }

        Ok(())
    }
}

impl From<Acknowledgment> for WriteConcern {
    fn from(w: Acknowledgment) -> Self {
        WriteConcern {
            w: Some(w),
            w_timeout: None,
            journal: None,
        }
    }
}
