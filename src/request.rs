//! Request rows for batch processing.

use crate::auth::RequestIdentity;
use crate::error::{LoyaltyError, Result};
use crate::operation::{ReadOp, WriteOp};
use csv::StringRecord;
use std::fmt;
use std::str::FromStr;

/// Which dispatch table a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A write operation, run with the caller's identity.
    Invoke,
    /// A read-only operation.
    Query,
}

impl FromStr for RequestKind {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "invoke" => Ok(RequestKind::Invoke),
            "query" => Ok(RequestKind::Query),
            other => Err(LoyaltyError::InvalidArgument(format!(
                "unknown request kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Invoke => f.write_str("invoke"),
            RequestKind::Query => f.write_str("query"),
        }
    }
}

/// One request as read from CSV.
///
/// Columns are `kind,caller,role,function,arg1,arg2`; rows may carry fewer
/// or more argument columns. Empty argument columns past the operation's
/// arity are ignored, so a one-argument operation can sit in a file whose
/// header has two, while an empty column inside the arity is an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub kind: RequestKind,

    /// Caller attributes; only consulted for invokes.
    pub identity: RequestIdentity,

    /// Operation name, matched case-sensitively.
    pub function: String,

    /// Every argument column, trimmed.
    pub args: Vec<String>,
}

impl RequestRecord {
    /// Parses one CSV row.
    pub fn from_row(row: &StringRecord) -> Result<Self> {
        let field = |i: usize| row.get(i).map(str::trim).filter(|s| !s.is_empty());

        let kind = field(0)
            .ok_or_else(|| LoyaltyError::InvalidArgument("missing request kind".into()))?
            .parse()?;
        let function = field(3)
            .ok_or_else(|| LoyaltyError::InvalidArgument("missing function name".into()))?
            .to_string();
        let identity = RequestIdentity {
            caller: field(1).map(String::from),
            role: field(2).map(String::from),
        };
        let args = row.iter().skip(4).map(|s| s.trim().to_string()).collect();

        Ok(RequestRecord {
            kind,
            identity,
            function,
            args,
        })
    }

    /// Argument count of the named operation in this request's table.
    pub fn arity(&self) -> Option<usize> {
        match self.kind {
            RequestKind::Invoke => self.function.parse::<WriteOp>().ok().map(WriteOp::arity),
            RequestKind::Query => self.function.parse::<ReadOp>().ok().map(ReadOp::arity),
        }
    }

    /// Arguments in the form the dispatcher takes.
    ///
    /// Trailing empty columns beyond the operation's arity are dropped; a
    /// non-empty surplus column is kept so the dispatcher can reject it.
    pub fn dispatch_args(&self) -> Vec<&str> {
        let arity = self.arity().unwrap_or(0);
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        while args.len() > arity && args.last().is_some_and(|a| a.is_empty()) {
            args.pop();
        }
        args
    }
}
