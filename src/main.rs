use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fluent_bundle::FluentArgs;
use rand::rngs::StdRng;
use rand::SeedableRng;

use tara::i18n::I18n;
use tara::storage::settings::{load_settings_from, save_settings_to, SETTINGS_FILE};
use tara::storage::{load_settings, save_settings, FileStore, Persistence};
use tara::{AdaptiveOpponent, Engine, Move, Opponent, Participant, Store};

/// Rock, paper, scissors and Tara against an adaptive computer.
#[derive(Debug, Parser)]
#[command(name = "tara", version)]
struct Args {
    /// Directory holding storage.json and settings.json
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Message language (en, de), remembered for later runs
    #[arg(long)]
    lang: Option<String>,
    /// Seed for the computer's choices
    #[arg(long)]
    seed: Option<u64>,
    /// Clear all saved progress before playing
    #[arg(long)]
    reset: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let (store, mut settings) = match &args.data_dir {
        Some(dir) => (
            FileStore::open_in(dir)
                .with_context(|| format!("cannot use data directory {}", dir.display()))?,
            load_settings_from(&dir.join(SETTINGS_FILE)),
        ),
        None => (
            FileStore::open_default().context("cannot open the game store")?,
            load_settings(),
        ),
    };

    if let Some(lang) = &args.lang {
        if settings.language.as_deref() != Some(lang.as_str()) {
            settings.language = Some(lang.clone());
            let saved = match &args.data_dir {
                Some(dir) => save_settings_to(&settings, &dir.join(SETTINGS_FILE)),
                None => save_settings(&settings),
            };
            if let Err(e) = saved {
                log::warn!("could not remember language {}: {}", lang, e);
            }
        }
    }

    let lang = settings.language.as_deref();
    let i18n = match find_resources_dir() {
        Some(dir) => I18n::load_from_dir(dir, lang),
        None => I18n::embedded(lang),
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let opponent = AdaptiveOpponent::with_weights(rng, settings.opponent);
    let mut engine = Engine::with_rules(Persistence::new(store), opponent, settings.rules);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", i18n.t("app-title"))?;
    if args.reset {
        engine.reset_all();
        writeln!(out, "{}", i18n.t("game-reset"))?;
    }
    run(&mut engine, &i18n, io::stdin().lock(), &mut out)
}

/// Locate the `resources/` directory with the message catalogues.
fn find_resources_dir() -> Option<PathBuf> {
    let candidates = [
        // cargo run from project root
        std::env::current_dir().ok().map(|d| d.join("resources")),
        // next to executable
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("resources"))),
    ];
    candidates.into_iter().flatten().find(|c| c.is_dir())
}

/// Read commands line by line until `quit` or end of input.
fn run<S: Store, O: Opponent>(
    engine: &mut Engine<S, O>,
    i18n: &I18n,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    print_status(engine, i18n, out)?;
    writeln!(out, "{}", i18n.t("prompt"))?;
    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        match command {
            "" => continue,
            "quit" | "q" => break,
            "reset" => {
                engine.reset_all();
                writeln!(out, "{}", i18n.t("game-reset"))?;
            }
            _ => match command.parse::<Move>() {
                Ok(mv) => play(engine, i18n, mv, out)?,
                Err(e) => {
                    let mut args = FluentArgs::new();
                    args.set("input", e.input);
                    writeln!(out, "{}", i18n.t_args("unknown-input", &args))?;
                }
            },
        }
        print_status(engine, i18n, out)?;
        writeln!(out, "{}", i18n.t("prompt"))?;
    }
    Ok(())
}

fn play<S: Store, O: Opponent>(
    engine: &mut Engine<S, O>,
    i18n: &I18n,
    mv: Move,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    engine.start_or_resume_match();
    let mut args = FluentArgs::new();
    args.set("match", engine.global_match_number());
    args.set("round", engine.round_number());
    writeln!(out, "{}", i18n.t_args("match-header", &args))?;

    let report = engine.play_round(mv);
    if mv == Move::Tara && report.player_move != Some(Move::Tara) {
        writeln!(out, "{}", i18n.t("tara-downgraded"))?;
    }
    if let (Some(player), Some(computer)) = (report.player_move, report.computer_move) {
        let mut args = FluentArgs::new();
        args.set("player", i18n.move_name(player));
        args.set("computer", i18n.move_name(computer));
        writeln!(out, "{}", i18n.t_args("moves-played", &args))?;
    }
    writeln!(out, "{}", i18n.round_outcome(report.outcome))?;

    if report.match_over {
        if let Some(winner) = engine.consume_match_outcome() {
            writeln!(out, "{}", i18n.match_winner(winner))?;
        }
    }
    Ok(())
}

fn print_status<S: Store, O: Opponent>(
    engine: &Engine<S, O>,
    i18n: &I18n,
    out: &mut impl Write,
) -> io::Result<()> {
    let (p, c) = (Participant::Player, Participant::Computer);
    writeln!(out, "{}", i18n.versus("status-health", engine.health(p), engine.health(c)))?;
    writeln!(out, "{}", i18n.versus("status-tara", engine.tara_count(p), engine.tara_count(c)))?;
    writeln!(out, "{}", i18n.versus("status-score", engine.score(p), engine.score(c)))
}
