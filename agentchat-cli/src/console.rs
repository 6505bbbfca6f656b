use agentchat_core::{Agent, ChatMessage, InlineData, Role, grounding_sources};
use agentchat_runner::{ChatRunner, RunnerError};
use anyhow::{Context, Result, bail};
use base64::Engine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::path::Path;

/// Read an image file as inline data.
pub fn load_image(path: &Path) -> Result<InlineData> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        bail!("{} is not an image ({})", path.display(), mime);
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(InlineData {
        mime_type: mime.essence_str().to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// Line-editor chat loop. `image` is attached to the first message sent.
pub async fn run_chat(
    runner: &ChatRunner,
    agent: &Agent,
    mut image: Option<InlineData>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("{} - {}", agent.name, agent.description);
    println!("Type your message and press Enter. Ctrl+C to exit.\n");
    for message in runner.memory().messages(&agent.id).await {
        print_message(agent, &message);
    }
    if image.is_some() {
        println!("(an image will be attached to your next message)");
    }

    loop {
        let readline = rl.readline("You -> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() && image.is_none() {
                    continue;
                }
                rl.add_history_entry(&line)?;

                print!("\n{} -> ", agent.name);
                flush();
                let mut streamed = String::new();
                let result = runner
                    .send_message_with(agent, &line, image.take(), |text| {
                        print!("{}", &text[streamed.len()..]);
                        flush();
                        streamed = text.to_string();
                    })
                    .await;

                let reply = match result {
                    Ok(reply) => reply,
                    Err(RunnerError::EmptyTurn) => continue,
                    Err(e) => return Err(e.into()),
                };
                if reply.text() != streamed {
                    if !streamed.is_empty() {
                        println!();
                    }
                    print!("{}", reply.text());
                }
                println!();
                print_sources(&reply);
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

fn print_message(agent: &Agent, message: &ChatMessage) {
    let speaker = match message.role {
        Role::User => "You",
        Role::Model => agent.name.as_str(),
    };
    let attachments = message.parts.iter().filter(|part| part.inline_data.is_some()).count();
    if attachments > 0 {
        println!("{} -> [{} image(s)] {}", speaker, attachments, message.text());
    } else {
        println!("{} -> {}", speaker, message.text());
    }
    print_sources(message);
    println!();
}

fn print_sources(message: &ChatMessage) {
    let Some(chunks) = message.grounding_chunks.as_deref() else {
        return;
    };
    let sources = grounding_sources(chunks);
    if sources.is_empty() {
        return;
    }
    println!("Sources:");
    for source in sources {
        println!("  - {} ({})", source.title, source.uri);
    }
}

fn flush() {
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_base64_with_guessed_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = load_image(&path).unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw==");
    }

    #[test]
    fn non_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(load_image(&path).is_err());
    }
}
