use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use crawl_core::{update, AppState, Msg, Phase};
use engine_logging::{engine_info, engine_warn};

use super::config::{self, CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::logging;
use super::ui::commands::{parse_command, Command, HELP};
use super::ui::render::{render, render_alert};

/// Everything the UI loop reacts to, in arrival order.
pub enum AppInput {
    Line(String),
    Engine(Msg),
    Eof,
}

pub fn run_app() -> anyhow::Result<()> {
    let config = config::load(Path::new(CONFIG_FILENAME))?;
    logging::initialize(config.log_destination(), config.log_level());
    engine_info!("crawl_console starting");

    let (input_tx, input_rx) = mpsc::channel::<AppInput>();
    let runner = EffectRunner::new(config.engine_settings(), input_tx.clone())?;
    spawn_stdin_reader(input_tx);

    // Not locked for the whole session: a terminal logger writes to stdout too.
    let mut out = io::stdout();
    let mut state = AppState::new();
    let mut stdin_closed = false;
    print_lines(&mut out, &render(&state.view()))?;

    while let Ok(input) = input_rx.recv() {
        let msgs = match input {
            AppInput::Line(line) => match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Help)) => {
                    writeln!(out, "{HELP}")?;
                    continue;
                }
                Ok(Some(command)) => command.into_msgs(state.form()),
                Ok(None) => continue,
                Err(message) => {
                    writeln!(out, "{message}")?;
                    continue;
                }
            },
            AppInput::Engine(msg) => vec![msg],
            AppInput::Eof => {
                stdin_closed = true;
                Vec::new()
            }
        };

        for msg in msgs {
            state = dispatch(state, msg, &runner, &mut out)?;
        }
        // Scripted input: keep going until the job no longer needs the engine.
        if stdin_closed && is_settled(&state) {
            break;
        }
    }

    engine_info!("crawl_console exiting");
    Ok(())
}

fn dispatch(
    state: AppState,
    msg: Msg,
    runner: &EffectRunner,
    out: &mut impl Write,
) -> io::Result<AppState> {
    let (mut state, effects) = update(state, msg);
    for alert in runner.enqueue(effects) {
        engine_warn!("Alert: {}", alert);
        print_lines(out, &render_alert(&alert))?;
    }
    if state.consume_dirty() {
        print_lines(out, &render(&state.view()))?;
    }
    Ok(state)
}

fn is_settled(state: &AppState) -> bool {
    !matches!(state.phase(), Phase::Submitting | Phase::Polling)
        && !state.document_export_busy()
        && state.archive_downloads() == 0
}

fn print_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<AppInput>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(AppInput::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(AppInput::Eof);
    });
}
