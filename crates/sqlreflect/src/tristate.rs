//! Three-valued booleans.
//!
//! The catalog reports boolean-ish attributes through the `yes_or_no`
//! domain, which is itself nullable. `Tristate` keeps NULL apart from NO so
//! callers have to decide what "unknown" means for them.

use std::fmt;

use crate::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    Yes,
    No,
    /// The catalog reported NULL.
    Unknown,
}

impl Tristate {
    /// Decode a `yes_or_no` value. Anything other than `YES`, `NO` or NULL
    /// is rejected.
    pub fn from_yes_or_no(column: &str, value: Option<&str>) -> Result<Self, DecodeError> {
        match value {
            None => Ok(Tristate::Unknown),
            Some("YES") => Ok(Tristate::Yes),
            Some("NO") => Ok(Tristate::No),
            Some(other) => Err(DecodeError::InvalidYesOrNo {
                column: column.to_owned(),
                value: other.to_owned(),
            }),
        }
    }

    pub fn is_yes(self) -> bool {
        self == Tristate::Yes
    }

    pub fn is_no(self) -> bool {
        self == Tristate::No
    }

    pub fn is_unknown(self) -> bool {
        self == Tristate::Unknown
    }

    pub fn to_option(self) -> Option<bool> {
        match self {
            Tristate::Yes => Some(true),
            Tristate::No => Some(false),
            Tristate::Unknown => None,
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(v: Option<bool>) -> Self {
        match v {
            Some(true) => Tristate::Yes,
            Some(false) => Tristate::No,
            None => Tristate::Unknown,
        }
    }
}

impl From<bool> for Tristate {
    fn from(v: bool) -> Self {
        Some(v).into()
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tristate::Yes => "YES",
            Tristate::No => "NO",
            Tristate::Unknown => "NULL",
        })
    }
}
