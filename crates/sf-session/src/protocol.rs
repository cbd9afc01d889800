//! Line protocol spoken with a solver bridge process.
//!
//! Each request is one line of whitespace-separated tokens. Each reply is one
//! line: `ok [payload...]` or `error <kind> <message...>`.

use crate::error::{SessionError, SessionResult};
use crate::value::{FieldValue, ModelOptions, SettingValue};
use std::path::Path;

/// A request understood by the solver bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Request<'a> {
    ReadCase { path: &'a Path },
    SetModel { name: &'a str, options: &'a ModelOptions },
    SetBoundary { surface: &'a str, key: &'a str, value: &'a SettingValue },
    Initialize,
    Iterate { iterations: u32 },
    Field { surface: &'a str, field: &'a str },
    Exit,
}

impl Request<'_> {
    /// Encode the request as a single protocol line (without newline).
    pub fn encode(&self) -> SessionResult<String> {
        let line = match self {
            Request::ReadCase { path } => {
                let path = path.to_str().ok_or_else(|| SessionError::Protocol {
                    message: format!("case path is not valid UTF-8: {}", path.display()),
                })?;
                format!("read-case {}", token(path)?)
            }
            Request::SetModel { name, options } => {
                let mut line = format!("set-model {}", token(name)?);
                for (key, value) in options.iter() {
                    line.push_str(&format!(" {}={}", token(key)?, token(&value.to_string())?));
                }
                line
            }
            Request::SetBoundary {
                surface,
                key,
                value,
            } => format!(
                "set-boundary {} {} {}",
                token(surface)?,
                token(key)?,
                token(&value.to_string())?
            ),
            Request::Initialize => "initialize".to_string(),
            Request::Iterate { iterations } => format!("iterate {}", iterations),
            Request::Field { surface, field } => {
                format!("field {} {}", token(surface)?, token(field)?)
            }
            Request::Exit => "exit".to_string(),
        };
        Ok(line)
    }
}

fn token(s: &str) -> SessionResult<&str> {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return Err(SessionError::Protocol {
            message: format!("'{}' is not a valid protocol token", s),
        });
    }
    Ok(s)
}

/// Parse a reply line. Returns the payload tokens of an `ok` reply, or the
/// session error carried by an `error` reply.
pub fn parse_reply(line: &str) -> SessionResult<Vec<&str>> {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("ok") => Ok(tokens.collect()),
        Some("error") => {
            let kind = tokens.next().unwrap_or_default();
            let message = tokens.collect::<Vec<_>>().join(" ");
            Err(match kind {
                "configuration" => SessionError::Configuration { message },
                "divergence" => SessionError::Divergence { message },
                "timeout" => SessionError::Timeout { message },
                "query" => SessionError::Query { message },
                other => SessionError::Protocol {
                    message: format!("unknown error kind '{}': {}", other, message),
                },
            })
        }
        _ => Err(SessionError::Protocol {
            message: format!("malformed reply: '{}'", line.trim()),
        }),
    }
}

/// Parse the payload of a successful `field` reply.
pub fn parse_field(payload: &[&str]) -> SessionResult<FieldValue> {
    let number = |s: &str| {
        let v = s.parse::<f64>().map_err(|_| SessionError::Protocol {
            message: format!("invalid number '{}' in field reply", s),
        })?;
        // Non-finite samples count as failed queries.
        sf_core::ensure_finite(v, "field sample").map_err(|e| SessionError::Query {
            message: e.to_string(),
        })
    };
    match payload {
        ["scalar", v] => Ok(FieldValue::Scalar(number(*v)?)),
        ["vector", x, y, z] => Ok(FieldValue::Vector([
            number(*x)?,
            number(*y)?,
            number(*z)?,
        ])),
        _ => Err(SessionError::Protocol {
            message: format!("malformed field payload: '{}'", payload.join(" ")),
        }),
    }
}

/// Ensure an `ok` reply carried no payload.
pub fn expect_empty(payload: &[&str]) -> SessionResult<()> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(SessionError::Protocol {
            message: format!("unexpected payload: '{}'", payload.join(" ")),
        })
    }
}
