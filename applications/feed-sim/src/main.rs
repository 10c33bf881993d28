/// Feed Simulator - scripted scrolling feed driving the audio focus coordinator
use clap::{Parser, Subcommand};
use feed_sim::{script, SimConfig, Simulator};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "feed-sim")]
#[command(about = "Scripted video feed simulator for audio focus coordination", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./feed-sim.toml if present)
    #[arg(short, long, env = "FEEDSIM_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scroll script and report final player state (default)
    Run {
        /// Override the number of mounted feed items
        #[arg(long)]
        items: Option<usize>,

        /// Override the failure injection seed
        #[arg(long)]
        seed: Option<u64>,

        /// Append this many random scroll steps
        #[arg(long)]
        random_steps: Option<usize>,

        /// Replace the configured script (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Skip unmutes superseded by a newer focus change
        #[arg(long)]
        cancel_superseded: bool,
    },
    /// Print the resolved configuration as TOML
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_sim=info,feed_audio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = SimConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run {
        items: None,
        seed: None,
        random_steps: None,
        steps: Vec::new(),
        cancel_superseded: false,
    }) {
        Commands::Run {
            items,
            seed,
            random_steps,
            steps,
            cancel_superseded,
        } => {
            if let Some(items) = items {
                config.simulation.items = items;
            }
            if let Some(seed) = seed {
                config.simulation.seed = seed;
            }
            if let Some(random_steps) = random_steps {
                config.simulation.random_steps = random_steps;
            }
            if !steps.is_empty() {
                config.simulation.script = steps;
            }
            if cancel_superseded {
                config.coordinator.cancel_superseded_unmutes = true;
            }
            run(config).await?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    config.validate()?;

    let mut steps = config.steps()?;
    steps.extend(script::random_steps(
        config.simulation.items,
        config.simulation.random_steps,
        config.simulation.seed,
    ));

    tracing::info!("Starting feed simulation");
    tracing::info!("Items: {}", config.simulation.items);
    tracing::info!("Steps: {}", steps.len());
    tracing::info!("Latency: {}ms", config.simulation.latency_ms);

    let mut simulator = Simulator::new(&config)?;
    simulator.mount_feed(config.simulation.items);
    let report = simulator.run(&steps).await;

    tracing::info!(
        "Final state: audio_enabled={} active={:?} fullscreen={}",
        report.snapshot.audio_enabled,
        report.snapshot.active_id,
        report.snapshot.fullscreen_active
    );
    for player in &report.players {
        tracing::info!(
            "  {} ({:?}): muted={} paused={} calls={} failures={}",
            player.id,
            player.kind,
            player.muted,
            player.paused,
            player.calls,
            player.failures
        );
    }

    if report.failures() > 0 {
        // Rejected mutes can legitimately leave extra players audible
        tracing::warn!(
            "{} control calls rejected; skipping invariant check",
            report.failures()
        );
        return Ok(());
    }

    report.check_invariants()?;
    tracing::info!("Invariants hold");
    Ok(())
}
