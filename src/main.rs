//! Terminal presentation shell: pick a game from the catalog and play it round by round.

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_round_engine::{
    config::AppConfig,
    dao::catalog::load_catalog,
    dto::{phase::VisiblePhase, view::RoundView},
    services::game_service,
    state::{AppState, SharedState},
};

type Input = Lines<BufReader<Stdin>>;

/// Where the player wants to go once a game view is left.
enum Exit {
    Next,
    Menu,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let loaded = load_catalog(config.catalog_path.as_deref(), config.reflex_round_seconds)
        .context("loading game catalog")?;
    if config.strict_content && !loaded.issues.is_empty() {
        bail!(
            "catalog has {} authoring issue(s); run catalog-lint for details",
            loaded.issues.len()
        );
    }

    let state = AppState::new(config, loaded.catalog);
    info!(games = state.catalog().len(), "game shell ready");

    tokio::select! {
        result = run_shell(state.clone()) => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted; leaving"),
    }

    for id in state
        .sessions()
        .iter()
        .map(|entry| *entry.key())
        .collect::<Vec<_>>()
    {
        if let Err(err) = game_service::close_session(&state, id).await {
            warn!(session_id = %id, error = %err, "failed to close session on exit");
        }
    }

    Ok(())
}

async fn run_shell(state: SharedState) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let games = game_service::list_games(&state);
        println!("\nPick a game (number), or `q` to quit:");
        for (position, game) in games.iter().enumerate() {
            let pace = match game.round_seconds {
                Some(seconds) => format!("reflex, {seconds}s per round"),
                None => "quiz".to_string(),
            };
            println!(
                "  {}. {} [{}] ({pace}, {} coins, {} XP)",
                position + 1,
                game.title,
                game.topic,
                game.total_coins,
                game.total_xp
            );
        }

        let Some(line) = input.next_line().await.context("reading stdin")? else {
            return Ok(());
        };
        let choice = line.trim();
        if choice == "q" {
            return Ok(());
        }
        let Some(mut game_id) = choice
            .parse::<usize>()
            .ok()
            .and_then(|number| games.get(number.wrapping_sub(1)))
            .map(|game| game.id.clone())
        else {
            println!("No game `{choice}`.");
            continue;
        };

        loop {
            match play(&state, &game_id, &mut input).await? {
                Exit::Next => match game_service::next_game(&state, &game_id) {
                    Some(next) => game_id = next.id.clone(),
                    None => {
                        println!("That was the last game. Well done!");
                        break;
                    }
                },
                Exit::Menu => break,
                Exit::Quit => return Ok(()),
            }
        }
    }
}

async fn play(state: &SharedState, game_id: &str, input: &mut Input) -> anyhow::Result<Exit> {
    let handle = game_service::open_session(state, game_id)?;
    let renderer = tokio::spawn(render(handle.subscribe()));
    println!("(answer with a number, `s` start, `r` retry, `n` next game, `m` menu, `q` quit)");

    let exit = loop {
        let Some(line) = input.next_line().await.context("reading stdin")? else {
            break Exit::Quit;
        };

        let result = match line.trim() {
            "s" | "start" => handle.start().await.map(drop),
            "r" | "retry" => handle.retry().await.map(drop),
            "n" | "next" => break Exit::Next,
            "m" | "menu" => break Exit::Menu,
            "q" | "quit" => break Exit::Quit,
            other => match other.parse::<usize>() {
                Ok(number) if number >= 1 => handle.submit_answer(number - 1).await.map(drop),
                _ => {
                    println!("  Unknown command `{other}`.");
                    continue;
                }
            },
        };

        if let Err(err) = result {
            println!("  Can't do that right now: {err}");
        }
    };

    renderer.abort();
    game_service::close_session(state, handle.id()).await?;
    Ok(exit)
}

async fn render(views: watch::Receiver<RoundView>) {
    let mut stream = WatchStream::new(views);
    let mut previous: Option<RoundView> = None;

    while let Some(view) = stream.next().await {
        render_view(previous.as_ref(), &view);
        previous = Some(view);
    }
}

fn render_view(previous: Option<&RoundView>, view: &RoundView) {
    let phase_changed = previous.is_none_or(|prev| prev.phase != view.phase);

    match view.phase {
        VisiblePhase::Ready => {
            if phase_changed {
                println!(
                    "\n== {} ==\n{} questions, {}s each. Press `s` to start.",
                    view.title,
                    view.total,
                    view.time_remaining.unwrap_or_default()
                );
            }
        }
        VisiblePhase::Playing => {
            let new_round = phase_changed
                || previous.is_some_and(|prev| prev.current_index != view.current_index);
            if new_round {
                if let Some(question) = &view.question {
                    println!(
                        "\n[{}/{}] {}",
                        view.current_index + 1,
                        view.total,
                        question.prompt
                    );
                    for (position, option) in question.options.iter().enumerate() {
                        println!("  {}. {} {}", position + 1, option.glyph, option.label);
                    }
                }
            }

            let new_feedback =
                view.feedback.is_some() && previous.is_none_or(|prev| prev.feedback.is_none());
            match view.feedback {
                Some(pulse) if new_feedback && pulse.celebrates() => {
                    println!("  🎉 Correct! +{} coins (score {})", pulse.points, view.score)
                }
                Some(_) if new_feedback => match view.time_remaining {
                    Some(0) => println!("  ⏰ Time's up!"),
                    _ => println!("  ❌ Not quite."),
                },
                _ => {
                    let ticked = !new_round
                        && !view.answered
                        && previous.is_some_and(|prev| prev.time_remaining != view.time_remaining);
                    if let (true, Some(seconds)) = (ticked, view.time_remaining) {
                        println!("  ⏱ {seconds}s");
                    }
                }
            }
        }
        VisiblePhase::Finished => {
            if phase_changed {
                if let Some(summary) = view.summary {
                    println!(
                        "\nFinished {}: {}/{} correct, {} coins.",
                        view.title, summary.score, summary.total, view.coins
                    );
                    if summary.passed() {
                        println!("Great job, you passed! `n` for the next game, `m` for the menu.");
                    } else {
                        println!(
                            "You needed {} to pass. `r` to try again, `m` for the menu.",
                            summary.threshold
                        );
                    }
                }
            }
        }
    }
}

/// Configure tracing subscribers; logs go to stderr so they do not mix with the game screen.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,quiz_round_engine=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
