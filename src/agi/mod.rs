//! The stdio gateway engine.
//!
//! Asterisk runs one gateway process per call and speaks to it over the
//! process's stdin/stdout: it first writes `agi_*: value` environment
//! lines up to a blank line, then answers one command line with one (or,
//! for usage errors, several) reply lines. [`Agi::new`] binds process
//! stdio, installs the hangup/pipe signal watchers, and reads the
//! environment block; any failure during construction is fatal.
//!
//! ```rust,no_run
//! use asterisk_ami_rs::agi::Agi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut agi = Agi::new().await?;
//!     tracing::info!("servicing channel {}", agi.env("agi_channel"));
//!
//!     agi.answer().await?;
//!     if let Some(digit) = agi.stream_file("welcome", "0123456789", 0).await? {
//!         agi.say_digits(digit.to_digit(10).unwrap_or(0) as i64, "").await?;
//!     }
//!     agi.hangup("").await?;
//!     Ok(())
//! }
//! ```
//!
//! Do not embed newlines in command arguments; the one exception is
//! [`verbose`](Agi::verbose), which splits its text into one command per
//! line.

mod commands;
mod response;
pub mod signals;

pub use commands::TddMode;
pub use response::AgiResponse;
pub use signals::SignalFlags;

use crate::error::{AgiError, AgiResult};
use response::{leading_int, parse_ok_reply, parse_status_line};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::{debug, trace};

/// Gateway engine bound to process stdio
pub type StdioAgi = Agi<BufReader<Stdin>, Stdout>;

/// The AGI engine.
///
/// Generic over its streams so tests can drive it over in-memory pipes;
/// production use goes through [`Agi::new`], which binds process stdio.
/// The engine is strictly sequential: one command line out, one reply in.
pub struct Agi<R, W> {
    reader: R,
    writer: W,
    env: Vec<(String, String)>,
    flags: Arc<SignalFlags>,
}

impl Agi<BufReader<Stdin>, Stdout> {
    /// Bind process stdio, install the signal watchers, and read the
    /// environment block.
    pub async fn new() -> AgiResult<Self> {
        signals::install()?;
        Self::from_streams(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }
}

impl<R, W> Agi<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Construct an engine over arbitrary streams, reading the environment
    /// block. The process-global signal flags are observed, but watcher
    /// installation is [`Agi::new`]'s job.
    pub async fn from_streams(reader: R, writer: W) -> AgiResult<Self> {
        Self::with_flags(reader, writer, Arc::clone(signals::process_flags())).await
    }

    /// Construct an engine observing a private set of signal flags
    pub async fn with_flags(reader: R, writer: W, flags: Arc<SignalFlags>) -> AgiResult<Self> {
        let mut agi = Self {
            reader,
            writer,
            env: Vec::new(),
            flags,
        };
        agi.read_env().await?;
        Ok(agi)
    }

    async fn read_env(&mut self) -> AgiResult<()> {
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                break;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| AgiError::parse(format!("malformed environment line: {line:?}")))?;
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.env.push((key.to_string(), value.to_string()));
        }
        debug!("read {} environment entries", self.env.len());
        Ok(())
    }

    /// Look up an environment variable, `""` when absent
    pub fn env(&self, key: &str) -> &str {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Iterate the environment in insertion order
    pub fn env_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raise [`AgiError::HangupBySignal`] if SIGHUP has been received
    pub fn test_hangup(&self) -> AgiResult<()> {
        if self.flags.got_hangup() {
            return Err(AgiError::HangupBySignal);
        }
        Ok(())
    }

    /// Clear the hangup and broken-pipe signal flags
    pub fn clear(&self) {
        self.flags.clear();
    }

    /// Write a command line verbatim, newline terminated.
    ///
    /// The command must not contain a newline.
    pub async fn send_command(&mut self, command: &str) -> AgiResult<()> {
        trace!("sending AGI command: {}", command);
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Execute a command and return its parsed reply.
    ///
    /// A hangup is tested for *before* sending: once the channel is gone
    /// Asterisk is no longer around to service us, and a hangup during
    /// execution surfaces as `-1` or `hangup` data instead. After parsing:
    /// `data == "hangup"` raises [`AgiError::HangupByResult`], a `-1`
    /// result raises [`AgiError::ApplicationError`], and a pending SIGPIPE
    /// raises [`AgiError::Io`].
    pub async fn execute(&mut self, command: &str) -> AgiResult<AgiResponse> {
        self.test_hangup()?;

        self.send_command(command).await?;
        let response = self.read_response().await?;

        if response.data == "hangup" {
            return Err(AgiError::HangupByResult);
        }
        if response.result == -1 {
            return Err(AgiError::ApplicationError(
                "an AGI command failed or the channel was hung up".to_string(),
            ));
        }
        if self.flags.got_pipe() {
            return Err(AgiError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "received SIGPIPE",
            )));
        }

        Ok(response)
    }

    async fn read_line(&mut self) -> AgiResult<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(AgiError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "error reading from the Asterisk server",
            )));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    async fn read_response(&mut self) -> AgiResult<AgiResponse> {
        let line = self.read_line().await?;
        trace!("AGI reply: {}", line);
        let (code, message) = parse_status_line(&line)?;

        match code {
            200 => Ok(parse_ok_reply(&message)),
            510 => Err(AgiError::InvalidCommand(message)),
            520 => {
                // usage block: accumulate until another 520 line
                let mut usage = message;
                loop {
                    let line = self.read_line().await?;
                    if leading_int(&line) == Some(520) {
                        break;
                    }
                    usage.push_str(&line);
                }
                Err(AgiError::UsageError(usage))
            }
            _ => Err(AgiError::UnknownError { code, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const ENV_BLOCK: &str = "agi_network: yes\n\
        agi_request: agi://localhost\n\
        agi_channel: SIP/100-00000001\n\
        agi_language: en\n\
        \n";

    type TestAgi = Agi<BufReader<tokio::io::DuplexStream>, tokio::io::DuplexStream>;

    /// Engine over in-memory pipes with private signal flags, plus the
    /// far ends for the test to drive
    async fn engine_with_peer(
        env: &str,
    ) -> (
        TestAgi,
        Arc<SignalFlags>,
        tokio::io::DuplexStream,
        tokio::io::DuplexStream,
    ) {
        let (mut peer_in, engine_in) = tokio::io::duplex(4096);
        let (engine_out, peer_out) = tokio::io::duplex(4096);

        peer_in.write_all(env.as_bytes()).await.unwrap();
        let flags = Arc::new(SignalFlags::new());
        let agi = Agi::with_flags(BufReader::new(engine_in), engine_out, Arc::clone(&flags))
            .await
            .unwrap();
        (agi, flags, peer_in, peer_out)
    }

    async fn read_peer_line(peer_out: &mut tokio::io::DuplexStream) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            peer_out.read_exact(&mut byte).await.unwrap();
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
        }
        String::from_utf8(line).unwrap()
    }

    #[tokio::test]
    async fn environment_is_read_in_order() {
        let (agi, _flags, _peer_in, _peer_out) = engine_with_peer(ENV_BLOCK).await;

        assert_eq!(agi.env("agi_network"), "yes");
        assert_eq!(agi.env("agi_channel"), "SIP/100-00000001");
        assert_eq!(agi.env("agi_missing"), "");

        let keys: Vec<&str> = agi.env_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["agi_network", "agi_request", "agi_channel", "agi_language"]
        );
    }

    #[tokio::test]
    async fn execute_round_trip() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("NOOP").await });

        assert_eq!(read_peer_line(&mut peer_out).await, "NOOP");
        peer_in.write_all(b"200 result=0\n").await.unwrap();

        let response = run.await.unwrap().unwrap();
        assert_eq!(response.code, 200);
        assert_eq!(response.result, 0);
        assert_eq!(response.result_string, "0");
    }

    #[tokio::test]
    async fn stream_file_reply_with_endpos() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.stream_file("welcome", "", 0).await });

        assert_eq!(
            read_peer_line(&mut peer_out).await,
            "STREAM FILE \"welcome\" \"\""
        );
        peer_in
            .write_all(b"200 result=53 endpos=12345\n")
            .await
            .unwrap();

        assert_eq!(run.await.unwrap().unwrap(), Some('5'));
    }

    #[tokio::test]
    async fn invalid_command_raises() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("BOGUS").await.map(|_| ()) });

        assert_eq!(read_peer_line(&mut peer_out).await, "BOGUS");
        peer_in
            .write_all(b"510 Invalid or unknown command\n")
            .await
            .unwrap();

        match run.await.unwrap() {
            Err(AgiError::InvalidCommand(text)) => {
                assert_eq!(text, "Invalid or unknown command")
            }
            other => panic!("expected InvalidCommand, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn usage_block_raises_usage_error() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("STREAM FILE").await.map(|_| ()) });

        let _ = read_peer_line(&mut peer_out).await;
        peer_in
            .write_all(
                b"520-Invalid command syntax. Proper usage follows:\n\
                  Usage: STREAM FILE <filename> <escape digits>\n\
                  520 End of proper usage.\n",
            )
            .await
            .unwrap();

        match run.await.unwrap() {
            Err(AgiError::UsageError(text)) => {
                assert!(text.contains("Proper usage follows"));
                assert!(text.contains("Usage: STREAM FILE"));
                assert!(!text.contains("End of proper usage"));
            }
            other => panic!("expected UsageError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_code_raises() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("NOOP").await.map(|_| ()) });
        let _ = read_peer_line(&mut peer_out).await;
        peer_in.write_all(b"404 not here\n").await.unwrap();

        match run.await.unwrap() {
            Err(AgiError::UnknownError { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message, "not here");
            }
            other => panic!("expected UnknownError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hangup_data_raises_hangup_by_result() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("GET VARIABLE \"X\"").await.map(|_| ()) });
        let _ = read_peer_line(&mut peer_out).await;
        peer_in.write_all(b"200 result=1 (hangup)\n").await.unwrap();

        assert!(matches!(run.await.unwrap(), Err(AgiError::HangupByResult)));
    }

    #[tokio::test]
    async fn minus_one_result_raises_application_error() {
        let (mut agi, _flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        let run = tokio::spawn(async move { agi.execute("EXEC \"Dial\" \"\"").await.map(|_| ()) });
        let _ = read_peer_line(&mut peer_out).await;
        peer_in.write_all(b"200 result=-1\n").await.unwrap();

        assert!(matches!(
            run.await.unwrap(),
            Err(AgiError::ApplicationError(_))
        ));
    }

    #[tokio::test]
    async fn hangup_signal_blocks_execution_until_cleared() {
        let (mut agi, flags, _peer_in, _peer_out) = engine_with_peer(ENV_BLOCK).await;

        flags.raise_hangup();
        assert!(matches!(agi.test_hangup(), Err(AgiError::HangupBySignal)));
        assert!(matches!(
            agi.execute("NOOP").await,
            Err(AgiError::HangupBySignal)
        ));

        agi.clear();
        assert!(agi.test_hangup().is_ok());
    }

    #[tokio::test]
    async fn pipe_signal_surfaces_after_execution() {
        let (mut agi, flags, mut peer_in, mut peer_out) = engine_with_peer(ENV_BLOCK).await;

        flags.raise_pipe();
        let run = tokio::spawn(async move { agi.execute("NOOP").await.map(|_| ()) });
        let _ = read_peer_line(&mut peer_out).await;
        peer_in.write_all(b"200 result=0\n").await.unwrap();

        assert!(matches!(run.await.unwrap(), Err(AgiError::Io(_))));
    }

    #[tokio::test]
    async fn malformed_environment_fails_construction() {
        let (mut peer_in, engine_in) = tokio::io::duplex(4096);
        let (engine_out, _peer_out) = tokio::io::duplex(4096);
        peer_in
            .write_all(b"no colon in this line\n\n")
            .await
            .unwrap();

        let result = Agi::from_streams(BufReader::new(engine_in), engine_out).await;
        assert!(matches!(result, Err(AgiError::Parse(_))));
    }
}
