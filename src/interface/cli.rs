use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use super::Interface;
use crate::config::InterfaceConfig;
use crate::error::Result;

const PROMPT: &str = ">> ";

type Reader = Box<dyn AsyncBufRead + Unpin + Send>;
type Writer = Box<dyn AsyncWrite + Unpin + Send>;

/// Line-oriented terminal interface
pub struct CliInterface {
    reader: Mutex<Reader>,
    writer: Mutex<Writer>,
    allow_empty: bool,
    exit_commands: Vec<String>,
}

impl CliInterface {
    pub fn new(
        reader: impl AsyncBufRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
        config: &InterfaceConfig,
    ) -> Self {
        Self {
            reader: Mutex::new(Box::new(reader)),
            writer: Mutex::new(Box::new(writer)),
            allow_empty: config.allow_empty,
            exit_commands: config.exit_commands.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Interface over the process stdin/stdout
    pub fn stdio(config: &InterfaceConfig) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), config)
    }

    fn is_exit_command(&self, input: &str) -> bool {
        let lower = input.to_lowercase();
        self.exit_commands.iter().any(|c| *c == lower)
    }

    async fn write(&self, text: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Interface for CliInterface {
    async fn input(&self) -> Result<Option<String>> {
        loop {
            self.write(PROMPT).await?;

            let mut line = String::new();
            let read = self.reader.lock().await.read_line(&mut line).await?;
            if read == 0 {
                self.write("\nExiting...\n").await?;
                return Ok(None);
            }

            let input = line.trim();
            if self.is_exit_command(input) {
                self.write("Exiting...\n").await?;
                return Ok(None);
            }

            if input.is_empty() && !self.allow_empty {
                self.write("Please enter a valid input (empty messages not allowed)\n").await?;
                continue;
            }

            return Ok(Some(input.to_string()));
        }
    }

    async fn output(&self, message: &str) -> Result<()> {
        self.write(&format!("[Agent]: {}\n", message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};

    /// Writer whose bytes stay readable after it is boxed
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<std::sync::Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl AsyncWrite for SharedBuf {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn interface(input: &str, config: &InterfaceConfig) -> (CliInterface, SharedBuf) {
        let out = SharedBuf::default();
        let cli = CliInterface::new(Cursor::new(input.as_bytes().to_vec()), out.clone(), config);
        (cli, out)
    }

    #[tokio::test]
    async fn test_reads_trimmed_lines() {
        let (cli, out) = interface("  hello  \nsecond\n", &InterfaceConfig::default());
        assert_eq!(cli.input().await.unwrap(), Some("hello".to_string()));
        assert_eq!(cli.input().await.unwrap(), Some("second".to_string()));
        assert_eq!(out.text(), ">> >> ");
    }

    #[tokio::test]
    async fn test_exit_commands_end_session() {
        let (cli, out) = interface("QUIT\n", &InterfaceConfig::default());
        assert_eq!(cli.input().await.unwrap(), None);
        assert!(out.text().ends_with("Exiting...\n"));
    }

    #[tokio::test]
    async fn test_eof_ends_session() {
        let (cli, _) = interface("", &InterfaceConfig::default());
        assert_eq!(cli.input().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_input_reprompts() {
        let (cli, out) = interface("\n   \nhi\n", &InterfaceConfig::default());
        assert_eq!(cli.input().await.unwrap(), Some("hi".to_string()));
        assert_eq!(
            out.text().matches("Please enter a valid input (empty messages not allowed)").count(),
            2
        );
    }

    #[tokio::test]
    async fn test_empty_input_allowed() {
        let config = InterfaceConfig {
            allow_empty: true,
            ..InterfaceConfig::default()
        };
        let (cli, _) = interface("\n", &config);
        assert_eq!(cli.input().await.unwrap(), Some(String::new()));
    }

    #[tokio::test]
    async fn test_output_prefix() {
        let (cli, out) = interface("", &InterfaceConfig::default());
        cli.output("Result: 4").await.unwrap();
        assert_eq!(out.text(), "[Agent]: Result: 4\n");
    }
}
