use anyhow::{Context, Result};
use crate::config::Config;
use crate::session::Session;
use crate::ui::conversation::{get_help_text, parse_slash_command, SlashCommand};
use std::io::{BufRead, Write};

/// Send one message and print the reply
pub async fn say(mut session: Session, message: String) -> Result<()> {
    let reply = session.submit(message).await?;
    println!("{}", reply.text());
    Ok(())
}

/// Print the effective configuration. Keys are never part of it.
pub fn show_config(config: &Config) -> Result<()> {
    println!("# home: {}", config.home.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Line-oriented chat: one line in, one reply out, until EOF or /bye
pub async fn repl<R: BufRead, W: Write>(
    session: &mut Session,
    mut input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "Chatting with {}. /help for commands, /bye to leave.", session.model_id())?;

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read user input")?;
        if read == 0 {
            writeln!(output)?;
            break;
        }

        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        if let Some(command) = parse_slash_command(line) {
            match command.command {
                SlashCommand::Bye => break,
                SlashCommand::Help => writeln!(output, "{}", get_help_text())?,
                SlashCommand::Model => writeln!(output, "Model: {}", session.model_id())?,
            }
            continue;
        }

        match session.submit(line).await {
            Ok(reply) => writeln!(output, "{}\n", reply.text())?,
            Err(failure) => writeln!(output, "Error: {failure}\n")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;
    use crate::error::RemoteCallFailure;
    use crate::testing::StubService;
    use crate::turn::TurnProcessor;
    use std::io::Cursor;
    use std::sync::Arc;

    #[tokio::test]
    async fn repl_runs_turns_until_eof() {
        let stub = StubService::new();
        stub.queue_reply("hi");
        stub.queue_failure(RemoteCallFailure::auth("bad key"));
        let mut session = Session::new(TurnProcessor::new(Arc::new(stub)));
        let mut output = Vec::new();

        repl(&mut session, Cursor::new("hello\n\n/model\nagain\n"), &mut output)
            .await
            .expect("repl failed");

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("hi\n"));
        assert!(printed.contains("Model: stub-model"));
        assert!(printed.contains("Error: bad key"));
        assert_eq!(
            session.history().all(),
            &[Turn::user("hello"), Turn::assistant("hi"), Turn::user("again")]
        );
    }

    #[tokio::test]
    async fn repl_stops_at_bye() {
        let mut session = Session::new(TurnProcessor::new(Arc::new(StubService::new())));
        let mut output = Vec::new();

        repl(&mut session, Cursor::new("/bye\nnever sent\n"), &mut output)
            .await
            .expect("repl failed");

        assert!(session.history().is_empty());
    }
}
