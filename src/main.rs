//! FitLife - Social Fitness Tracking Client Core
//!
//! Headless entry point: restores the session, loads the collections, and
//! prints a feed and ranking summary. Mainly useful for smoke-testing a
//! backend configuration.

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fitlife::config;
use fitlife::store::AppStore;
use fitlife::HttpGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FitLife v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config().context("loading configuration")?;
    if !config.has_backend() {
        anyhow::bail!(
            "no backend configured; set backend.base_url and backend.api_key in {}",
            config::get_config_path().display()
        );
    }

    let gateway = HttpGateway::new(&config.backend.base_url, &config.backend.api_key);
    let mut store = AppStore::new(gateway);
    if config.preferences.notifications_enabled {
        store.toggle_notifications();
    }

    let restored = store.bootstrap().await.context("restoring session")?;
    if !restored {
        println!("No persisted session. Sign in through a client UI first.");
        return Ok(());
    }

    let now = Utc::now();
    let state = store.state();

    if let Some(user) = &state.current_user {
        println!(
            "{} - level {} ({}), {} points",
            user.name,
            user.level,
            user.tier.as_str(),
            user.points
        );
    }
    println!(
        "Streak: {} day(s), workouts this week: {:?}",
        store.streak(now.date_naive()),
        store.weekly(now)
    );

    println!("\nFeed ({} posts):", state.posts.len());
    for post in state.posts.iter().take(10) {
        println!(
            "  {} - {} ({} min, {} likes)",
            post.author.name,
            post.activity,
            post.duration_min,
            post.likes
        );
    }

    println!("\nRanking:");
    for user in state.ranking.iter().take(10) {
        println!(
            "  #{} {} - {} pts [{}]",
            user.rank,
            user.name,
            user.points,
            user.tier.as_str()
        );
    }

    println!("\nChallenges:");
    for challenge in &state.challenges {
        println!(
            "  {} ({}) - {} participants",
            challenge.title,
            challenge.status(now).as_str(),
            challenge.participants.len()
        );
    }

    Ok(())
}
