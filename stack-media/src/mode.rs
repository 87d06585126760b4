use std::fmt;
use std::str::FromStr;

use crate::MediaError;

/// How a stream is opened, parsed from an fopen mode string.
///
/// | mode | read | write | start  | missing object | existing object  |
/// |------|------|-------|--------|----------------|------------------|
/// | `r`  | yes  | no    | 0      | empty buffer   | contents         |
/// | `r+` | yes  | yes   | 0      | empty buffer   | contents         |
/// | `w`  | +    | yes   | 0      | created        | truncated        |
/// | `a`  | +    | yes   | end    | created        | contents         |
/// | `x`  | +    | yes   | 0      | created        | `AlreadyExists`  |
/// | `c`  | +    | yes   | 0      | created        | contents         |
///
/// `+` grants reading for `w`, `a`, `x` and `c`. `b` and `t` are accepted
/// and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
}

impl OpenMode {
    /// `r`
    pub fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            truncate: false,
            create: false,
            create_new: false,
        }
    }

    /// `w`
    pub fn write_truncate() -> Self {
        Self {
            read: false,
            write: true,
            append: false,
            truncate: true,
            create: true,
            create_new: false,
        }
    }

    /// `a`
    pub fn append() -> Self {
        Self {
            read: false,
            write: true,
            append: true,
            truncate: false,
            create: true,
            create_new: false,
        }
    }

    /// Whether the current contents must be fetched on open
    pub(crate) fn loads_contents(&self) -> bool {
        !self.truncate && !self.create_new
    }

    /// Whether opening an absent object should create it
    pub(crate) fn creates(&self) -> bool {
        self.create || self.create_new
    }
}

impl FromStr for OpenMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MediaError::InvalidMode {
            mode: s.to_string(),
        };

        let mut chars = s.chars();
        let mut mode = match chars.next() {
            Some('r') => Self::read_only(),
            Some('w') => Self::write_truncate(),
            Some('a') => Self::append(),
            Some('x') => Self {
                create: false,
                create_new: true,
                truncate: false,
                ..Self::write_truncate()
            },
            Some('c') => Self {
                truncate: false,
                ..Self::write_truncate()
            },
            _ => return Err(invalid()),
        };

        for flag in chars {
            match flag {
                '+' => {
                    mode.read = true;
                    mode.write = true;
                }
                'b' | 't' => {}
                _ => return Err(invalid()),
            }
        }

        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = if self.create_new {
            "x"
        } else if self.append {
            "a"
        } else if self.truncate {
            "w"
        } else if self.create {
            "c"
        } else {
            "r"
        };
        let plus = if self.read && self.write { "+" } else { "" };
        write!(f, "{}{}", base, plus)
    }
}
