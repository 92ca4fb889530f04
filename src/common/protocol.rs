//! # Stream Protocol
//!
//! Text commands sent from client to server, in first-match order:
//!
//! | Message                    | Command                                  |
//! |----------------------------|------------------------------------------|
//! | `LIST`                     | [`Command::List`]                        |
//! | `GET-<filename>`           | [`Command::Get`]                         |
//! | `PUT-<filename>\n<bytes>`  | [`Command::Put`] with inline contents    |
//! | `PUT-<filename>`           | [`Command::Put`], contents in next frame |
//! | `BYE`                      | [`Command::Bye`]                         |
//!
//! Replies are a newline-joined listing, raw file bytes, `OK`, `ACK`, or an
//! error text starting with [`ERROR_PREFIX`]. `BYE` gets no reply.

use std::fmt;
use std::sync::OnceLock;

use super::errors::{PatternError, RouteError};
use super::router::Router;

pub const REPLY_OK: &str = "OK";
pub const REPLY_ACK: &str = "ACK";
pub const ERROR_PREFIX: &str = "ERROR: ";

/// A classified stream command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Get {
        filename: String,
    },
    /// `contents` is `Some` for an inline upload, `None` when the bytes follow
    /// in a separate frame.
    Put {
        filename: String,
        contents: Option<String>,
    },
    Bye,
}

impl Command {
    /// Build the protocol routing table.
    pub fn router() -> Result<Router<Command>, PatternError> {
        let mut router = Router::new();
        router
            .register("LIST", |_| Command::List)?
            .register("GET-{filename}", |caps| Command::Get {
                filename: caps.text("filename"),
            })?
            .register("PUT-{filename:word}\n{contents:*}", |caps| Command::Put {
                filename: caps.text("filename"),
                contents: Some(caps.text("contents")),
            })?
            .register("PUT-{filename:word}", |caps| Command::Put {
                filename: caps.text("filename"),
                contents: None,
            })?
            .register("BYE", |_| Command::Bye)?;
        Ok(router)
    }

    /// Classify a decoded text message.
    pub fn parse(message: &str) -> Result<Command, RouteError> {
        static ROUTER: OnceLock<Router<Command>> = OnceLock::new();
        ROUTER
            .get_or_init(|| Command::router().expect("protocol patterns are well-formed"))
            .dispatch(message)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List => write!(f, "LIST"),
            Command::Get { filename } => write!(f, "GET-{}", filename),
            Command::Put {
                filename,
                contents: Some(contents),
            } => write!(f, "PUT-{}\n{}", filename, contents),
            Command::Put {
                filename,
                contents: None,
            } => write!(f, "PUT-{}", filename),
            Command::Bye => write!(f, "BYE"),
        }
    }
}

pub fn error_reply(message: impl fmt::Display) -> String {
    format!("{}{}", ERROR_PREFIX, message)
}

/// The error text of a reply, if the reply is an error.
pub fn as_error_reply(reply: &[u8]) -> Option<String> {
    reply
        .strip_prefix(ERROR_PREFIX.as_bytes())
        .map(|rest| String::from_utf8_lossy(rest).into_owned())
}

/// Join names into a listing reply, without a trailing newline.
pub fn join_listing<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a listing reply. An empty reply is an empty listing.
pub fn split_listing(reply: &str) -> Vec<String> {
    if reply.is_empty() {
        return Vec::new();
    }
    reply.split('\n').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("LIST"), Ok(Command::List));
        assert_eq!(Command::parse("BYE"), Ok(Command::Bye));
        assert_eq!(
            Command::parse("GET-report.txt"),
            Ok(Command::Get {
                filename: "report.txt".into()
            })
        );
        assert_eq!(
            Command::parse("PUT-b.txt"),
            Ok(Command::Put {
                filename: "b.txt".into(),
                contents: None
            })
        );
    }

    #[test]
    fn test_oversized_malformed_commands_are_rejected_quickly() {
        let name = "a".repeat(1 << 20);
        let started = std::time::Instant::now();

        assert!(Command::parse(&format!("GET-{}\n", name)).is_err());
        assert_eq!(
            Command::parse(&format!("PUT-{}", name)),
            Ok(Command::Put {
                filename: name.clone(),
                contents: None
            })
        );
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_inline_put_keeps_newlines() {
        assert_eq!(
            Command::parse("PUT-a.txt\nhello"),
            Ok(Command::Put {
                filename: "a.txt".into(),
                contents: Some("hello".into())
            })
        );
        assert_eq!(
            Command::parse("PUT-a.txt\nline one\nline two"),
            Ok(Command::Put {
                filename: "a.txt".into(),
                contents: Some("line one\nline two".into())
            })
        );
    }

    #[test]
    fn test_unknown_commands() {
        assert!(Command::parse("list").is_err());
        assert!(Command::parse("").is_err());
        assert!(Command::parse("GET-").is_err());
        assert!(Command::parse("BYE ").is_err());
    }

    #[test]
    fn test_display_matches_grammar() {
        for command in [
            Command::List,
            Command::Bye,
            Command::Get {
                filename: "x.bin".into(),
            },
            Command::Put {
                filename: "y.txt".into(),
                contents: None,
            },
            Command::Put {
                filename: "z.txt".into(),
                contents: Some("a\nb".into()),
            },
        ] {
            assert_eq!(Command::parse(&command.to_string()), Ok(command));
        }
    }

    #[test]
    fn test_router_order() {
        let router = Command::router().unwrap();
        assert_eq!(
            router.patterns().collect::<Vec<_>>(),
            [
                "LIST",
                "GET-{filename}",
                "PUT-{filename:word}\n{contents:*}",
                "PUT-{filename:word}",
                "BYE"
            ]
        );
    }

    #[test]
    fn test_listing_helpers() {
        assert_eq!(join_listing(&["a.txt", "b.txt"]), "a.txt\nb.txt");
        assert_eq!(join_listing::<&str>(&[]), "");
        assert_eq!(split_listing("a.txt\nb.txt"), ["a.txt", "b.txt"]);
        assert!(split_listing("").is_empty());
    }

    #[test]
    fn test_error_reply() {
        let reply = error_reply("file not found: x");
        assert_eq!(reply, "ERROR: file not found: x");
        assert_eq!(as_error_reply(reply.as_bytes()).as_deref(), Some("file not found: x"));
        assert_eq!(as_error_reply(b"hi"), None);
    }
}
