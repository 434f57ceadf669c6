// Terminal front end: the same login gate and chat bots as the web UI,
// driven line by line over any reader/writer pair.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{error, info};

use crate::auth::{Gatekeeper, LoginState};
use crate::bot::{ChatBot, Exchange};
use crate::constants::{CHAT_FAILURE, LABEL_CHAT_ROOM, LABEL_PASSWORD, LABEL_USERNAME};

/// Reads one line without its terminator. `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(Some(trimmed.to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<Option<String>> {
    write!(output, "{}: ", label)?;
    output.flush()?;
    read_line(input)
}

/// Asks for credentials until one attempt succeeds, then relays each input
/// line to `bot`. Returns the conversation when input ends.
pub async fn run_terminal_chat<R, W>(
    bot: &dyn ChatBot,
    gatekeeper: &Gatekeeper,
    mut input: R,
    mut output: W,
) -> Result<Vec<Exchange>>
where
    R: BufRead,
    W: Write,
{
    let mut history = Vec::new();
    let mut state = LoginState::default();

    while !state.is_logged_in() {
        let Some(username) = prompt(&mut input, &mut output, LABEL_USERNAME)? else {
            return Ok(history);
        };
        let Some(password) = prompt(&mut input, &mut output, LABEL_PASSWORD)? else {
            return Ok(history);
        };
        let outcome = gatekeeper.login(&mut state, &username, &password);
        writeln!(output, "{}", outcome.status)?;
    }

    info!("Terminal chat session started");
    writeln!(output, "## {}", LABEL_CHAT_ROOM)?;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let Some(message) = read_line(&mut input)? else {
            break;
        };
        if message.trim().is_empty() {
            continue;
        }

        match bot.reply(&history, &message).await {
            Ok(reply) => {
                writeln!(output, "{}", reply)?;
                history.push(Exchange::new(message, reply));
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                writeln!(output, "{}", CHAT_FAILURE)?;
            }
        }
    }
    writeln!(output)?;
    info!(exchanges = history.len(), "Terminal chat session finished");
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::error::{ChatError, ChatResult};
    use async_trait::async_trait;
    use std::io::Cursor;

    /// Echoes the message with the number of prior exchanges it was given.
    struct EchoBot;

    #[async_trait]
    impl ChatBot for EchoBot {
        async fn reply(&self, history: &[Exchange], message: &str) -> ChatResult<String> {
            if message == "fail" {
                return Err(ChatError::MalformedResponse("stub".into()));
            }
            Ok(format!("{}:{}", history.len(), message))
        }
    }

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::new(Credentials::new("alice", "secret"))
    }

    async fn run(script: &str) -> (Vec<Exchange>, String) {
        let mut output = Vec::new();
        let history = run_terminal_chat(&EchoBot, &gatekeeper(), Cursor::new(script), &mut output)
            .await
            .unwrap();
        (history, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_read_line_strips_terminators_only() {
        let mut input = Cursor::new(" padded \r\nlast");
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some(" padded "));
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some("last"));
        assert_eq!(read_line(&mut input).unwrap(), None);
    }

    #[tokio::test]
    async fn test_retries_login_then_chats_with_history() {
        let (history, output) = run("alice\nwrong\nalice\nsecret\nhi\n\nmore\n").await;

        assert!(output.contains("ユーザー名またはパスワードが間違っています。"));
        assert!(output.contains("ログイン成功！"));
        assert!(output.contains("## チャットルーム"));
        assert_eq!(
            history,
            vec![Exchange::new("hi", "0:hi"), Exchange::new("more", "1:more")]
        );
    }

    #[tokio::test]
    async fn test_eof_before_login_never_reaches_chat() {
        let (history, output) = run("alice\nwrong\n").await;
        assert!(history.is_empty());
        assert!(!output.contains("チャットルーム"));
    }

    #[tokio::test]
    async fn test_model_error_is_shown_and_session_continues() {
        let (history, output) = run("alice\nsecret\nfail\nok\n").await;
        assert!(output.contains(CHAT_FAILURE));
        assert_eq!(history, vec![Exchange::new("ok", "0:ok")]);
    }
}
