//! # Client Core
//!
//! Issues stream commands against one connected server and interprets the
//! replies. Requests are strictly sequential: every method sends one command
//! and reads its reply before returning.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut client = FileShareClient::connect("192.168.1.20:30001", None).await?;
//! for name in client.list().await? {
//!     println!("{}", name);
//! }
//! let bytes = client.get("report.txt").await?;
//! client.put("copy.txt", &bytes).await?;
//! client.bye().await?;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::common::connection::Connection;
use crate::common::errors::ClientError;
use crate::common::protocol::{as_error_reply, split_listing, Command, REPLY_ACK, REPLY_OK};

pub struct FileShareClient<S = TcpStream> {
    conn: Connection<S>,
}

impl FileShareClient<TcpStream> {
    /// Connect to a server; `read_timeout` bounds each idle read while waiting for a reply.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        read_timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut conn = Connection::connect(addr).await?;
        conn.set_read_timeout(read_timeout);
        Ok(Self { conn })
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.conn.peer_addr()?)
    }
}

impl<S> FileShareClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_connection(conn: Connection<S>) -> Self {
        Self { conn }
    }

    /// Names of the files in the server's shared directory.
    pub async fn list(&mut self) -> Result<Vec<String>, ClientError> {
        let reply = self.request(&Command::List).await?;
        let text = String::from_utf8(reply).map_err(|e| {
            ClientError::UnexpectedReply(String::from_utf8_lossy(e.as_bytes()).into_owned())
        })?;
        Ok(split_listing(&text))
    }

    /// Raw contents of a remote file.
    pub async fn get(&mut self, filename: &str) -> Result<Vec<u8>, ClientError> {
        self.request(&Command::Get {
            filename: filename.to_string(),
        })
        .await
    }

    /// Upload `contents` as `filename`: announce, wait for `OK`, send the
    /// bytes as a second frame, wait for `ACK`.
    pub async fn put(&mut self, filename: &str, contents: &[u8]) -> Result<(), ClientError> {
        let reply = self
            .request(&Command::Put {
                filename: filename.to_string(),
                contents: None,
            })
            .await?;
        expect_reply(&reply, REPLY_OK)?;

        self.conn.send(contents).await?;
        let reply = self.read_reply().await?;
        expect_reply(&reply, REPLY_ACK)
    }

    /// Upload text in a single `PUT-<name>\n<contents>` frame.
    pub async fn put_inline(&mut self, filename: &str, contents: &str) -> Result<(), ClientError> {
        let reply = self
            .request(&Command::Put {
                filename: filename.to_string(),
                contents: Some(contents.to_string()),
            })
            .await?;
        expect_reply(&reply, REPLY_ACK)
    }

    /// Say goodbye and close the connection. The server sends no reply.
    pub async fn bye(mut self) -> Result<(), ClientError> {
        self.conn.send_text(&Command::Bye.to_string()).await?;
        self.conn.close().await?;
        Ok(())
    }

    async fn request(&mut self, command: &Command) -> Result<Vec<u8>, ClientError> {
        debug!("-> {}", command);
        self.conn.send_text(&command.to_string()).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Vec<u8>, ClientError> {
        let reply = self.conn.receive().await?.ok_or(ClientError::Disconnected)?;
        match as_error_reply(&reply) {
            Some(message) => Err(ClientError::Remote(message)),
            None => Ok(reply),
        }
    }
}

fn expect_reply(reply: &[u8], expected: &str) -> Result<(), ClientError> {
    if reply == expected.as_bytes() {
        Ok(())
    } else {
        Err(ClientError::UnexpectedReply(
            String::from_utf8_lossy(reply).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    type Step = (Vec<u8>, Option<Vec<u8>>);

    fn ask(expected: &[u8], reply: &[u8]) -> Step {
        (expected.to_vec(), Some(reply.to_vec()))
    }

    fn silent(expected: &[u8]) -> Step {
        (expected.to_vec(), None)
    }

    /// Scripted server: answers each expected request with a canned reply.
    fn scripted(script: Vec<Step>) -> FileShareClient<tokio::io::DuplexStream> {
        let (client, server) = duplex(64 * 1024);
        tokio::spawn(async move {
            let mut conn = Connection::new(server);
            for (expected, reply) in script {
                let got = conn.receive().await.unwrap().unwrap();
                assert_eq!(got, expected);
                if let Some(reply) = reply {
                    conn.send(&reply).await.unwrap();
                }
            }
        });
        FileShareClient::from_connection(Connection::new(client))
    }

    #[tokio::test]
    async fn test_list_splits_names() {
        let mut client = scripted(vec![ask(b"LIST", b"a.txt\nb.txt"), ask(b"LIST", b"")]);
        assert_eq!(client.list().await.unwrap(), ["a.txt", "b.txt"]);
        assert!(client.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_returns_raw_bytes() {
        let mut client = scripted(vec![ask(b"GET-x.bin", &[0, 1, 2, 255])]);
        assert_eq!(client.get("x.bin").await.unwrap(), [0, 1, 2, 255]);
    }

    #[tokio::test]
    async fn test_remote_error() {
        let mut client = scripted(vec![ask(b"GET-nope", b"ERROR: file not found: nope")]);
        assert!(matches!(
            client.get("nope").await,
            Err(ClientError::Remote(message)) if message == "file not found: nope"
        ));
    }

    #[tokio::test]
    async fn test_put_two_frames() {
        let mut client = scripted(vec![ask(b"PUT-b.txt", b"OK"), ask(b"world", b"ACK")]);
        client.put("b.txt", b"world").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_rejected_before_payload() {
        let mut client = scripted(vec![ask(b"PUT-..", b"ERROR: invalid file name: \"..\"")]);
        assert!(matches!(
            client.put("..", b"x").await,
            Err(ClientError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn test_put_inline() {
        let mut client = scripted(vec![ask(b"PUT-a.txt\nhello", b"ACK")]);
        client.put_inline("a.txt", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_while_waiting() {
        let mut client = scripted(vec![silent(b"LIST")]);
        assert!(matches!(
            client.list().await,
            Err(ClientError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_bye_sends_command() {
        let client = scripted(vec![silent(b"BYE")]);
        client.bye().await.unwrap();
    }
}
