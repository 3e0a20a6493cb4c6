use std::future::Future;

use anyhow::Result;
use clap::Parser;
use client_core::{Composer, ComposerEvent, HttpPoemApi};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast::{
        self,
        error::{RecvError, TryRecvError},
    },
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_entry, render_poem};

#[derive(Parser, Debug)]
#[command(about = "Write a poem together with an AI, one illustrated stanza at a time")]
struct Args {
    #[arg(long, default_value = "http://localhost:4000")]
    server_url: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Clear,
    Show,
    Retry,
    Help,
    Line(String),
}

fn parse_command(input: &str) -> Option<Command> {
    match input.trim() {
        "" => None,
        "/quit" | "/exit" => Some(Command::Quit),
        "/clear" => Some(Command::Clear),
        "/poem" => Some(Command::Show),
        "/retry" => Some(Command::Retry),
        "/help" => Some(Command::Help),
        _ => Some(Command::Line(input.trim_end_matches(['\r', '\n']).to_string())),
    }
}

const HELP: &str = "Type a line and press enter to add it to the poem.\n\
Commands: /poem (show poem), /retry (resubmit the last failed line), /clear (start over), /quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut composer = Composer::new(HttpPoemApi::new(&args.server_url)?);
    let mut events = composer.subscribe();

    println!("Verse & Vision\n{HELP}\n");
    with_events(composer.load(), &mut events, print_event).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(input) = lines.next_line().await? else {
            break;
        };
        match parse_command(&input) {
            None => continue,
            Some(Command::Quit) => break,
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Show) => print!("{}", render_poem(composer.state().poem())),
            Some(Command::Clear) => with_events(composer.clear(), &mut events, print_event).await,
            Some(Command::Retry) => {
                if !with_events(composer.submit(), &mut events, print_event).await {
                    println!("Nothing to retry.");
                }
            }
            Some(Command::Line(line)) => {
                composer.set_draft(line);
                with_events(composer.submit(), &mut events, print_event).await;
            }
        }
    }
    Ok(())
}

fn print_event(event: ComposerEvent) {
    match event {
        ComposerEvent::PoemLoaded(poem) => print!("{}", render_poem(&poem)),
        ComposerEvent::Progress(message) => println!("... {message}"),
        ComposerEvent::EntryAdded { number, entry } => print!("\n{}", render_entry(number, &entry)),
        ComposerEvent::Failed(message) => println!("! {message}"),
        ComposerEvent::Cleared => println!("Poem cleared."),
    }
}

/// Runs `action` while handing composer events to `on_event` as they arrive,
/// then drains anything still queued so all output precedes the next prompt.
async fn with_events<F: Future>(
    action: F,
    events: &mut broadcast::Receiver<ComposerEvent>,
    mut on_event: impl FnMut(ComposerEvent),
) -> F::Output {
    tokio::pin!(action);
    let output = loop {
        tokio::select! {
            output = action.as_mut() => break output,
            received = events.recv() => match received {
                Ok(event) => on_event(event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "composer events dropped"),
                Err(RecvError::Closed) => break action.as_mut().await,
            },
        }
    };
    loop {
        match events.try_recv() {
            Ok(event) => on_event(event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "composer events dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    output
}
