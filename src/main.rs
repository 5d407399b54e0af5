use anyhow::Result;
use log::{LevelFilter, info, warn};
use seirei_garden::app::{self, Action, ParseError};
use seirei_garden::config::{CONFIG_FILE, Config, LoggingConfig, SubscriptionConfig};
use seirei_garden::persist::{FileStore, SnapshotStore};
use seirei_garden::sim::game::Game;
use seirei_garden::subscription::{PremiumCache, SubscriptionClient, SubscriptionStatus};
use std::time::Duration;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

enum Event {
    Status(Result<SubscriptionStatus>),
    Checkout(Result<String>),
}

struct Subscription {
    client: SubscriptionClient,
    user_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).await?,
        None => Config::load_or_default(CONFIG_FILE).await?,
    };
    init_logging(&config.logging);

    let store = FileStore::in_dir(&config.storage.data_dir);
    info!("using snapshot {}", store.path().display());
    let mut game = match store.load()? {
        Some(state) => {
            let mut game = Game::from_state(state);
            game.add_message("Loaded save state.");
            game
        }
        None => {
            let mut game = Game::fresh(now_ms());
            game.add_message("Welcome to the spirit garden.");
            game
        }
    };
    if let Some(seed) = config.game.seed {
        game = game.with_seed(seed);
    }
    let mut game = game.with_store(Box::new(store));

    let input = BufReader::new(io::stdin());
    let result = run(&mut game, &config, input).await;
    game.flush()?;
    info!("snapshot flushed, goodbye");
    result
}

async fn run<R>(game: &mut Game, config: &Config, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut lines = input.lines();

    let subscription = subscription_from(&config.subscription);
    let mut premium = PremiumCache::new();
    let mut tick = tokio::time::interval(Duration::from_secs(config.game.tick_seconds));
    let refresh_every = Duration::from_secs(config.subscription.refresh_minutes.max(1) * 60);
    let mut refresh = tokio::time::interval(refresh_every);

    println!("{}", app::HELP);
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let context = Context {
                        subscription: subscription.as_ref(),
                        premium: &premium,
                        event_tx: &event_tx,
                    };
                    if handle_line(&line, game, &context) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("stdin read failed: {err}");
                    break;
                }
            },
            Some(event) = event_rx.recv() => match event {
                Event::Status(result) => {
                    if let Some(is_premium) = premium.reconcile(result) {
                        game.set_premium(is_premium);
                    }
                }
                Event::Checkout(result) => match result {
                    Ok(url) => println!("Open {url} to subscribe."),
                    Err(err) => {
                        warn!("checkout creation failed: {err:#}");
                        println!("Checkout is unavailable right now.");
                    }
                },
            },
            _ = tick.tick() => {
                game.tick(now_ms());
            }
            _ = refresh.tick(), if subscription.is_some() => {
                if let Some(subscription) = &subscription {
                    spawn_status_fetch(subscription, &event_tx);
                }
            }
        }
        for message in game.take_messages() {
            println!("{message}");
        }
    }

    Ok(())
}

struct Context<'a> {
    subscription: Option<&'a Subscription>,
    premium: &'a PremiumCache,
    event_tx: &'a UnboundedSender<Event>,
}

fn handle_line(line: &str, game: &mut Game, context: &Context<'_>) -> bool {
    let action = match app::parse_action(line) {
        Ok(action) => action,
        Err(ParseError::Empty) => return false,
        Err(err) => {
            println!("{err}");
            return false;
        }
    };

    match action {
        Action::Help => println!("{}", app::HELP),
        Action::Status => {
            print!("{}", app::status_report(game.state()));
            if context.subscription.is_some() {
                println!("Subscription: {}", context.premium.describe());
            }
        }
        Action::Inventory => print!("{}", app::inventory_report(game.state())),
        Action::Play { mode, score, level } => {
            if game.state().is_mode_unlocked(mode) {
                game.complete_session(score, mode, level);
            } else {
                println!("The {mode} game is still locked.");
            }
        }
        Action::Heal {
            spirit_id,
            formula_id,
        } => {
            if game.heal_spirit(&spirit_id, formula_id).is_none() {
                println!("Nothing happened: unknown spirit or no formula #{formula_id} in stock.");
            }
        }
        Action::Feed { spirit_id, drug_id } => {
            if game.feed_drug(&spirit_id, drug_id).is_none() {
                println!("Nothing happened: unknown spirit or no crude drug #{drug_id} in stock.");
            }
        }
        Action::Craft { formula_id } => {
            if let Err(err) = game.craft_formula(formula_id) {
                info!("craft #{formula_id} refused: {err}");
                if let Some(hint) = app::craft_hint(&err) {
                    println!("{hint}");
                }
            }
        }
        Action::Request => {
            if game.refresh_active_request(now_ms()).is_none() {
                println!("No spirit is around to ask for anything.");
            }
        }
        Action::Preset(preset) => {
            game.apply_preset(preset);
            println!("Applied preset {preset}.");
        }
        Action::SetFlag { flag, value } => game.set_flag(flag, value),
        Action::Notice => match game.take_unlock_notice() {
            Some(notice) => println!("{}: {}", notice.title, notice.message),
            None => println!("No new unlocks."),
        },
        Action::Checkout => match context.subscription {
            Some(subscription) => spawn_checkout(subscription, context.event_tx),
            None => println!("Subscriptions are not configured."),
        },
        Action::Quit => return true,
    }

    if let Some(spirit_id) = game.take_heal_notice() {
        println!("{spirit_id} looks refreshed!");
    }
    false
}

fn subscription_from(config: &SubscriptionConfig) -> Option<Subscription> {
    if !config.enabled {
        return None;
    }
    Some(Subscription {
        client: SubscriptionClient::new(config),
        user_id: config.user_id.clone()?,
    })
}

fn spawn_status_fetch(subscription: &Subscription, event_tx: &UnboundedSender<Event>) {
    let client = subscription.client.clone();
    let user_id = subscription.user_id.clone();
    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_status(&user_id).await;
        let _ = event_tx.send(Event::Status(result));
    });
}

fn spawn_checkout(subscription: &Subscription, event_tx: &UnboundedSender<Event>) {
    let client = subscription.client.clone();
    let user_id = subscription.user_id.clone();
    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        let result = client.create_checkout(&user_id).await;
        let _ = event_tx.send(Event::Checkout(result));
    });
}

fn init_logging(config: &LoggingConfig) {
    let level = config.level.parse().unwrap_or(LevelFilter::Info);
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_env("RUST_LOG");
    if builder.try_init().is_err() {
        eprintln!("logger already initialised");
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seirei_garden::sim::mode::GameMode;

    #[tokio::test]
    async fn console_lines_drive_the_store_until_quit() {
        let mut game = Game::fresh(0).with_seed(4);
        let input: &[u8] = b"play chain 600\ncraft 1\nplay sort 10\nquit\nplay chain 9000\n";
        run(&mut game, &Config::default(), input).await.expect("run");

        let progress = &game.state().progress;
        assert_eq!(progress.sessions_played, 1);
        assert_eq!(progress.best_score(GameMode::Chain), 600);
        assert_eq!(progress.best_score(GameMode::Sort), 0);
    }

    #[tokio::test]
    async fn end_of_input_stops_the_loop() {
        let mut game = Game::fresh(0).with_seed(4);
        let input: &[u8] = b"play chain 100\n";
        run(&mut game, &Config::default(), input).await.expect("run");
        assert_eq!(game.state().progress.sessions_played, 1);
    }
}
