//! Interactive client loop.

use std::{collections::HashSet, sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    error::ClientError,
    infrastructure::transport::{TransportConfig, TransportManager, WebSocketConnector},
};

use super::{
    cli::{self, CliCommand, CliError},
    session::{SessionConfig, SyncSession},
    sound::ConsoleSoundPlayer,
};

const PROMPT: &str = "> ";

/// Connect and run the interactive client until `quit`, end of input or Ctrl+C.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    config.validate()?;

    let connector = WebSocketConnector::new(config.url.clone());
    tracing::info!("Connecting to {} as {}", connector.url(), config.username);
    let (mut manager, mut events) = TransportManager::new(connector, TransportConfig::from(&config));
    let sound = Arc::new(ConsoleSoundPlayer::new());
    let mut session = SyncSession::new(
        SessionConfig::from(&config),
        manager.handle(),
        sound.clone(),
    );

    let (lines_tx, mut lines) = mpsc::unbounded_channel();
    spawn_input(lines_tx).await?;

    manager.connect().await;
    println!("{}", cli::HELP);

    let mut clock = tokio::time::interval(Duration::from_secs(1));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shown = HashSet::new();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if session.handle_event(event).await {
                    print_active(&session).await;
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                match cli::parse_command(&line) {
                    Ok(CliCommand::Quit) => break,
                    Ok(command) => handle_command(&mut session, command).await,
                    Err(CliError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
            _ = clock.tick() => {
                session.tick_clocks().await;
                session.prune_messages().await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        for effect in sound.drain() {
            println!("*{}*", effect.name());
        }
        print_new_messages(&session, &mut shown).await;
    }

    manager.close().await;
    Ok(())
}

async fn handle_command(session: &mut SyncSession, command: CliCommand) {
    match command {
        CliCommand::Session(command) => {
            if session.apply(command).await {
                print_active(session).await;
            }
        }
        CliCommand::Board => print_active(session).await,
        CliCommand::Games => {
            let games = session.games();
            if games.is_empty() {
                println!("No games yet");
            }
            for game_id in games {
                let marker = if session.active_game() == Some(&game_id) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {game_id}");
            }
        }
        CliCommand::Help => println!("{}", cli::HELP),
        CliCommand::Quit => {}
    }
}

async fn print_active(session: &SyncSession) {
    let Some((history, index)) = session.active_view().await else {
        if let Some(game_id) = session.active_game() {
            println!("Waiting for game {game_id}...");
        }
        return;
    };
    let Some(snapshot) = history.get(index) else {
        return;
    };

    let viewer = session.viewer_color(&history);
    println!("{}", cli::render_summary(&history, index, viewer));
    println!("{}", cli::render_board(snapshot, viewer, session.selection()));
}

/// Print display messages not printed before; forget ids that have expired.
async fn print_new_messages(session: &SyncSession, shown: &mut HashSet<Uuid>) {
    let messages = session.messages();
    let board = messages.lock().await;

    for message in board.all() {
        if shown.insert(message.id) {
            println!("{}", cli::render_message(message));
        }
    }
    shown.retain(|id| board.all().iter().any(|message| message.id == *id));
}

/// Read lines on a dedicated thread; the channel closes on Ctrl+D or Ctrl+C.
async fn spawn_input(lines: mpsc::UnboundedSender<String>) -> Result<(), ClientError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("rankfile-input".to_string())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => {
                    let _ = ready_tx.send(Ok(()));
                    editor
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                match editor.readline(PROMPT) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                        }
                        if lines.send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                    Err(e) => {
                        tracing::error!("Input error: {}", e);
                        break;
                    }
                }
            }
        })?;

    match ready_rx.await {
        Ok(result) => result.map_err(ClientError::from),
        Err(_) => Ok(()),
    }
}
