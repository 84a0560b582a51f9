//! Interactive terminal chat.
//!
//! Reads one question per line, prints the answer as it streams in.
//! `/clear` resets the conversation and `/quit` (or end of input) exits.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use omnibus_chat::ChatLoop;

const CLEAR_COMMAND: &str = "/clear";
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

pub async fn run_terminal<R, W>(chat: &mut ChatLoop, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    writeln!(out, "Omnibus Rules Chatbot")?;
    writeln!(
        out,
        "This serves as a chatbot where you can ask anything about the Omnibus Rules"
    )?;
    writeln!(out, "Type {} to start over, /quit to leave.", CLEAR_COMMAND)?;

    let mut lines = input.lines();
    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&question) {
            break;
        }
        if question == CLEAR_COMMAND {
            chat.reset();
            writeln!(out, "Chat cleared.")?;
            continue;
        }

        let result = chat
            .ask_streaming(question, &mut |fragment: &str| {
                // A broken stdout surfaces on the next prompt write.
                let _ = write!(out, "{}", fragment);
                let _ = out.flush();
            })
            .await;
        match result {
            Ok(_) => writeln!(out)?,
            Err(e) => writeln!(out, "\nError: {}", e)?,
        }
    }

    writeln!(out)?;
    Ok(())
}
