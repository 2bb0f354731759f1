//! PTY (console) channel — reads lines from stdin, routes them, prints the
//! `Q:`/`A:` exchange to stdout.
//!
//! Lines starting with `/` that match a console command are handled here and
//! never reach the router. Long-term memory is saved when the loop ends,
//! whatever the reason.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::router::{ReplyKind, Router};
use crate::session::Session;
use crate::system_info::SystemReport;
use super::Channel;

const HELP: &str = "\
Commands:
  /clear     forget the recent conversation
  /save      write long-term memory to disk
  /history   show the recent conversation
  /sysinfo   show host CPU, memory, disk and network figures
  /help      show this list
  /quit      save and exit";

/// Console commands recognised before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Clear,
    Save,
    History,
    SysInfo,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/clear" => Some(Command::Clear),
            "/save" => Some(Command::Save),
            "/history" => Some(Command::History),
            "/sysinfo" => Some(Command::SysInfo),
            "/help" => Some(Command::Help),
            "/quit" | "/exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

// ── PtyChannel ───────────────────────────────────────────────────────────────

pub struct PtyChannel {
    channel_id: String,
    bot_name: String,
    router: Arc<Router>,
    session: Session,
}

impl PtyChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bot_name: impl Into<String>,
        router: Arc<Router>,
        session: Session,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bot_name: bot_name.into(),
            router,
            session,
        }
    }
}

impl Channel for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(
        self: Box<Self>,
        shutdown: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>> {
        Box::pin(async move {
            let PtyChannel { channel_id, bot_name, router, mut session } = *self;
            info!(%channel_id, "pty channel started");

            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_console(stdin, &mut stdout, &bot_name, &router, &mut session, shutdown).await?;

            info!(%channel_id, "pty channel stopped");
            Ok(())
        })
    }
}

// ── run_console ──────────────────────────────────────────────────────────────

/// Console loop over any line source and sink.
pub async fn run_console<R, W>(
    reader: R,
    out: &mut W,
    bot_name: &str,
    router: &Router,
    session: &mut Session,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "─────────────────────────────────")?;
    writeln!(out, " Welcome to {bot_name}  (/help for commands, Ctrl-C to quit)")?;
    writeln!(out, "─────────────────────────────────")?;

    let mut lines = reader.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out)?;
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("console read error: {e}");
                break;
            }
            Ok(None) => {
                info!("console input closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        if let Some(cmd) = Command::parse(&input) {
            debug!(?cmd, "console command");
            match cmd {
                Command::Clear => {
                    session.clear_history();
                    writeln!(out, "History cleared.")?;
                }
                Command::Save => save(out, session)?,
                Command::History => {
                    if session.history.is_empty() {
                        writeln!(out, "(history is empty)")?;
                    }
                    for l in session.history.lines() {
                        writeln!(out, "{l}")?;
                    }
                }
                Command::SysInfo => {
                    let report = SystemReport::collect().await;
                    writeln!(out, "{report}\n")?;
                }
                Command::Help => writeln!(out, "{HELP}")?,
                Command::Quit => break,
            }
            continue;
        }

        let reply = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out)?;
                info!("console shutting down mid-request");
                break;
            }

            reply = router.route(&input, session) => reply,
        };
        match reply.kind {
            ReplyKind::Prompt => writeln!(out, "{}", reply.text)?,
            _ => writeln!(out, "Q: {input}\nA: {}\n", reply.text)?,
        }
    }

    save(out, session)
}

/// Save long-term memory, reporting the outcome on the console. A failed
/// save is not fatal.
fn save<W: Write>(out: &mut W, session: &Session) -> Result<(), AppError> {
    match session.save_memory() {
        Ok(()) => writeln!(out, "Long-term memory saved to {}.", session.memory.path().display())?,
        Err(e) => {
            warn!(error = %e, "long-term memory save failed");
            writeln!(out, "Failed to save long-term memory: {e}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use crate::llm::providers::mock::MockProvider;
    use crate::memory::{LongTermMemory, ShortTermHistory};
    use crate::router::Capabilities;
    use serde_json::json;
    use tempfile::TempDir;

    fn router() -> Router {
        Router::new(Capabilities::default(), None, LlmProvider::Mock(MockProvider))
    }

    fn session(dir: &TempDir) -> Session {
        Session::new(
            ShortTermHistory::default(),
            LongTermMemory::load(dir.path().join("ltm.json")).unwrap(),
        )
    }

    async fn drive(input: &str, session: &mut Session) -> String {
        let mut out = Vec::new();
        run_console(input.as_bytes(), &mut out, "test", &router(), session, CancellationToken::new())
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse("/clear"), Some(Command::Clear));
        assert_eq!(Command::parse("  /quit "), Some(Command::Quit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(Command::parse("/clearly"), None);
        assert_eq!(Command::parse("clear"), None);
        assert_eq!(Command::parse("/sysinfo"), Some(Command::SysInfo));
    }

    #[tokio::test]
    async fn prints_exchange_and_saves_on_eof() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let out = drive("2+2\nhello\n", &mut s).await;

        assert!(out.contains("Welcome to test"));
        assert!(out.contains("Q: 2+2\nA: The answer is 4.\n"));
        assert!(out.contains("Q: hello\nA: Mock response for: hello\n"));
        assert!(out.contains("Long-term memory saved to"));
        assert!(dir.path().join("ltm.json").exists());
        assert_eq!(s.history.len(), 4);
    }

    #[tokio::test]
    async fn blank_line_prompts() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let out = drive("   \n", &mut s).await;
        assert!(out.contains("Please enter a question.\n"));
        assert!(!out.contains("Q:    "));
        assert!(s.history.is_empty());
    }

    #[tokio::test]
    async fn clear_keeps_long_term_memory() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        s.memory.insert("name", json!("Ada"));
        let out = drive("hi\n/clear\n/history\n", &mut s).await;

        assert!(out.contains("History cleared."));
        assert!(out.contains("(history is empty)"));
        assert!(s.history.is_empty());
        let saved = std::fs::read_to_string(dir.path().join("ltm.json")).unwrap();
        assert_eq!(saved, r#"{"name":"Ada"}"#);
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let out = drive("/quit\nhello\n", &mut s).await;
        assert!(!out.contains("Mock response"));
        assert!(s.history.is_empty());
    }

    #[tokio::test]
    async fn history_command_lists_lines() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let out = drive("1+1\n/history\n", &mut s).await;
        assert!(out.contains("Q: 1+1\nA: The answer is 2.\n"));
    }

    #[tokio::test]
    async fn cancelled_token_ends_loop() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let token = CancellationToken::new();
        token.cancel();
        let mut out = Vec::new();
        run_console("hello\n".as_bytes(), &mut out, "test", &router(), &mut s, token)
            .await
            .unwrap();
        assert!(s.history.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Long-term memory saved"));
    }

    #[tokio::test]
    async fn sysinfo_prints_host_report_without_routing() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let out = drive("/sysinfo\n", &mut s).await;
        for label in ["OS: ", "CPU Usage (%): ", "Logical Cores: ", "Total Memory (GB): ", "Timestamp: "] {
            assert!(out.contains(label), "missing {label} in {out}");
        }
        assert!(out.contains("GPU: No GPU detected"));
        assert!(s.history.is_empty());
    }

    #[cfg(feature = "provider-openai")]
    #[tokio::test]
    async fn shutdown_during_generation_exits_and_saves() {
        use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
        use std::time::Duration;
        use tokio::net::TcpListener;

        // Accepts the request and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(120)).await;
        });
        let llm = OpenAiCompatibleProvider::new(
            format!("http://{addr}/v1/chat/completions"),
            "test-model".into(),
            0.7,
            50,
            120,
            None,
        )
        .unwrap();
        let router = Router::new(Capabilities::default(), None, LlmProvider::OpenAiCompatible(llm));

        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let mut out = Vec::new();
        tokio::time::timeout(
            Duration::from_secs(10),
            run_console("hello\n".as_bytes(), &mut out, "test", &router, &mut s, token),
        )
        .await
        .expect("console did not stop on shutdown")
        .unwrap();

        assert_eq!(s.history.to_vec(), vec!["Q: hello"]);
        assert!(dir.path().join("ltm.json").exists());
        assert!(String::from_utf8(out).unwrap().contains("Long-term memory saved"));
    }
}
