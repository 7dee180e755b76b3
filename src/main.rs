mod app;
mod ui;

use anyhow::{Context, Result};
use app::{Action, App, SaveMode};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gogi::GitignoreClient;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, io::AsyncWriteExt, sync::mpsc};

const GITIGNORE: &str = ".gitignore";

enum AppEvent {
    Tick,
    Key(event::KeyEvent),
    TemplatesLoaded(Vec<String>),
    ListFailed(String),
    PreviewLoaded(String, String),
    PreviewFailed(String, String),
    Saved(String),
    SaveFailed(String),
}

/// Raw-mode terminal that is restored when dropped, even on error paths.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let client = GitignoreClient::with_defaults().context("failed to set up gitignore.io client")?;
    let host = client.config().host.clone();

    let mut session = TerminalSession::new()?;
    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel(100);

    spawn_list(&client, tx.clone());
    spawn_input(tx.clone());

    loop {
        if let Some(name) = app.take_preview_request() {
            spawn_preview(&client, tx.clone(), name);
        }

        session.terminal.draw(|f| ui::draw(f, &app, &host))?;

        let Some(ev) = rx.recv().await else { break };
        match ev {
            AppEvent::Tick => {}
            AppEvent::TemplatesLoaded(templates) => app.set_templates(templates),
            AppEvent::ListFailed(err) => {
                app.is_loading = false;
                app.error = Some(err);
            }
            AppEvent::PreviewLoaded(name, content) => app.preview_loaded(name, content),
            AppEvent::PreviewFailed(name, err) => app.preview_failed(name, err),
            AppEvent::Saved(message) => {
                app.saved(message);
                if app.quit_after_save {
                    break;
                }
            }
            AppEvent::SaveFailed(err) => app.save_failed(err),
            AppEvent::Key(key) => match app.on_key(key) {
                Action::None => {}
                Action::Quit => break,
                Action::Save(None) if Path::new(GITIGNORE).exists() => app.ask_save_mode(),
                Action::Save(mode) => {
                    app.is_saving = true;
                    let mode = mode.unwrap_or(SaveMode::Overwrite);
                    spawn_save(&client, tx.clone(), app.selected_names(), mode);
                }
            },
        }
    }

    Ok(())
}

fn spawn_list(client: &GitignoreClient, tx: mpsc::Sender<AppEvent>) {
    let client = client.clone();
    tokio::spawn(async move {
        let event = match client.list().await {
            Ok(templates) => AppEvent::TemplatesLoaded(templates),
            Err(e) => AppEvent::ListFailed(e.to_string()),
        };
        let _ = tx.send(event).await;
    });
}

fn spawn_preview(client: &GitignoreClient, tx: mpsc::Sender<AppEvent>, name: String) {
    let client = client.clone();
    tokio::spawn(async move {
        let event = match client.get(&[name.as_str()]).await {
            Ok(content) => {
                AppEvent::PreviewLoaded(name, String::from_utf8_lossy(&content).into_owned())
            }
            Err(e) => AppEvent::PreviewFailed(name, e.to_string()),
        };
        let _ = tx.send(event).await;
    });
}

fn spawn_save(
    client: &GitignoreClient,
    tx: mpsc::Sender<AppEvent>,
    names: Vec<String>,
    mode: SaveMode,
) {
    let client = client.clone();
    tokio::spawn(async move {
        let event = match save(&client, &names, mode, PathBuf::from(GITIGNORE)).await {
            Ok(message) => AppEvent::Saved(message),
            Err(e) => AppEvent::SaveFailed(format!("{:#}", e)),
        };
        let _ = tx.send(event).await;
    });
}

/// Forwards key presses and a periodic tick to the event loop.
fn spawn_input(tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press
                        && tx.send(AppEvent::Key(key)).await.is_err()
                    {
                        break;
                    }
                }
            }
            if tx.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Fetches the combined template for `names` and writes it to `path`.
async fn save(
    client: &GitignoreClient,
    names: &[String],
    mode: SaveMode,
    path: PathBuf,
) -> Result<String> {
    let content = client.get(names).await?;

    match mode {
        SaveMode::Overwrite => fs::write(&path, &content)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        SaveMode::Append => {
            let mut file = fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            file.write_all(b"\n").await?;
            file.write_all(&content).await?;
            file.flush().await?;
        }
    }

    let verb = match mode {
        SaveMode::Append => "Appended",
        SaveMode::Overwrite => "Wrote",
    };
    Ok(format!("{} {} template(s) to {}", verb, names.len(), path.display()))
}
