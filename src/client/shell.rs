//! # Interactive Shell
//!
//! Line-oriented front end for the client binary. Each input line is routed
//! through the same [`Router`] type the server uses; a line no pattern
//! matches is a local usage error and never reaches the network.

use anyhow::{bail, Context, Result};
use log::warn;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::client::FileShareClient;
use super::config::ClientConfig;
use crate::common::errors::{ClientError, PatternError};
use crate::common::router::Router;
use crate::common::storage::SharedDirectory;
use crate::discovery::DiscoveryScanner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Scan,
    Connect { addr: String, port: String },
    LocalList,
    RemoteList,
    Put { filename: String },
    Get { filename: String },
    Bye,
    Help,
    Exit,
}

impl ShellCommand {
    pub fn router() -> Result<Router<ShellCommand>, PatternError> {
        let mut router = Router::new();
        router
            .register("scan", |_| ShellCommand::Scan)?
            .register("connect {addr:word} {port:word}", |caps| ShellCommand::Connect {
                addr: caps.text("addr"),
                port: caps.text("port"),
            })?
            .register("llist", |_| ShellCommand::LocalList)?
            .register("rlist", |_| ShellCommand::RemoteList)?
            .register("put {filename:word}", |caps| ShellCommand::Put {
                filename: caps.text("filename"),
            })?
            .register("get {filename:word}", |caps| ShellCommand::Get {
                filename: caps.text("filename"),
            })?
            .register("bye", |_| ShellCommand::Bye)?
            .register("help", |_| ShellCommand::Help)?
            .register("exit", |_| ShellCommand::Exit)?;
        Ok(router)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

struct Remote {
    label: String,
    client: FileShareClient,
}

pub struct Shell {
    config: ClientConfig,
    local: SharedDirectory,
    router: Router<ShellCommand>,
    remote: Option<Remote>,
}

impl Shell {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let local = SharedDirectory::new(config.client.shared_dir.clone());
        let router = ShellCommand::router()?;
        Ok(Self {
            config,
            local,
            router,
            remote: None,
        })
    }

    pub fn connected_to(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.label.as_str())
    }

    /// Read commands from stdin until `exit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        self.local.ensure_exists().await?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match self.connected_to() {
                Some(label) => print!("\n({}) Enter Command: ", label),
                None => print!("\nEnter Command: "),
            }
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.handle_line(line).await == Flow::Exit {
                break;
            }
        }

        if let Some(remote) = self.remote.take() {
            if let Err(e) = remote.client.bye().await {
                warn!("⚠️ Failed to say goodbye to {}: {}", remote.label, e);
            }
        }
        Ok(())
    }

    /// Route and execute one input line, printing the outcome.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match self.router.dispatch(line) {
            Ok(command) => command,
            Err(_) => {
                println!("Invalid command, type 'help' for the list");
                return Flow::Continue;
            }
        };

        match self.execute(command).await {
            Ok(flow) => flow,
            Err(e) => {
                println!("Error: {:#}", e);
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Scan => {
                let replies = DiscoveryScanner::new(self.config.discovery.clone())
                    .scan()
                    .await?;
                if replies.is_empty() {
                    println!("No services found :(");
                } else {
                    println!("Services found:");
                    for reply in replies {
                        println!("\t{}: {}", reply.sender.ip(), reply.message);
                    }
                }
            }
            ShellCommand::Connect { addr, port } => {
                if let Some(label) = self.connected_to() {
                    bail!("already connected to {}, disconnect first with 'bye'", label);
                }
                let port: u16 = port
                    .parse()
                    .with_context(|| format!("invalid port {:?}", port))?;
                let client = FileShareClient::connect(
                    (addr.as_str(), port),
                    self.config.client.read_timeout(),
                )
                .await
                .with_context(|| format!("connecting to {}:{}", addr, port))?;

                let label = format!("{}:{}", addr, port);
                println!("Successfully connected to {}", label);
                self.remote = Some(Remote { label, client });
            }
            ShellCommand::LocalList => {
                println!("Local files:");
                for name in self.local.list_entries().await? {
                    println!("\t{}", name);
                }
            }
            ShellCommand::RemoteList => {
                let result = self.remote()?.client.list().await;
                let names = self.keep_if_alive(result)?;
                println!("Remote files:");
                for name in names {
                    println!("\t{}", name);
                }
            }
            ShellCommand::Get { filename } => {
                SharedDirectory::check_name(&filename)?;
                let result = self.remote()?.client.get(&filename).await;
                let contents = self.keep_if_alive(result)?;
                self.local.write_file(&filename, &contents).await?;
                println!("{} successfully downloaded ({} bytes)", filename, contents.len());
            }
            ShellCommand::Put { filename } => {
                self.remote()?;
                let contents = self.local.read_file(&filename).await?;
                let result = self.remote()?.client.put(&filename, &contents).await;
                self.keep_if_alive(result)?;
                println!("{} successfully uploaded", filename);
            }
            ShellCommand::Bye => {
                let remote = self.remote.take().context("not connected")?;
                remote.client.bye().await?;
                println!("Disconnected from {}", remote.label);
            }
            ShellCommand::Help => {
                println!("Valid commands are:");
                for pattern in self.router.patterns() {
                    println!("\t{}", pattern);
                }
            }
            ShellCommand::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    fn remote(&mut self) -> Result<&mut Remote> {
        self.remote
            .as_mut()
            .context("not connected, use 'connect <address> <port>' first")
    }

    /// Forget the connection when the failure means it is gone.
    fn keep_if_alive<T>(&mut self, result: Result<T, ClientError>) -> Result<T> {
        if let Err(ClientError::Disconnected | ClientError::Transport(_)) = &result {
            if let Some(remote) = self.remote.take() {
                println!("Lost connection to {}", remote.label);
            }
        }
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(dir: &std::path::Path) -> Shell {
        let mut config = ClientConfig::default();
        config.client.shared_dir = dir.to_path_buf();
        Shell::new(config).unwrap()
    }

    #[test]
    fn test_shell_routes() {
        let router = ShellCommand::router().unwrap();
        assert_eq!(router.dispatch("scan"), Ok(ShellCommand::Scan));
        assert_eq!(
            router.dispatch("connect 192.168.1.20 30001"),
            Ok(ShellCommand::Connect {
                addr: "192.168.1.20".into(),
                port: "30001".into()
            })
        );
        assert_eq!(
            router.dispatch("get notes.txt"),
            Ok(ShellCommand::Get {
                filename: "notes.txt".into()
            })
        );
        assert!(router.dispatch("get two words").is_err());
        assert!(router.dispatch("LIST").is_err());
    }

    #[tokio::test]
    async fn test_remote_commands_need_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert_eq!(shell.handle_line("rlist").await, Flow::Continue);
        assert!(matches!(
            shell.execute(ShellCommand::RemoteList).await,
            Err(e) if e.to_string().contains("not connected")
        ));
        assert!(shell.connected_to().is_none());
    }

    #[tokio::test]
    async fn test_bad_port_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        let result = shell
            .execute(ShellCommand::Connect {
                addr: "127.0.0.1".into(),
                port: "99999".into(),
            })
            .await;
        assert!(result.is_err());
        assert!(shell.connected_to().is_none());
    }

    #[tokio::test]
    async fn test_unknown_line_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(dir.path());

        assert_eq!(shell.handle_line("dance").await, Flow::Continue);
        assert_eq!(shell.handle_line("help").await, Flow::Continue);
        assert_eq!(shell.handle_line("llist").await, Flow::Continue);
        assert_eq!(shell.handle_line("exit").await, Flow::Exit);
    }
}
