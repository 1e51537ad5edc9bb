//! Wellbeing Risk Engine CLI
//!
//! Computes, stores, and reviews wellbeing risk assessments.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, select, tick};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wellbeing_risk_engine::{
    alert::{dispatch_alert, TracingAlertSink},
    audit::{create_shared_log_with_persistence, SharedAssessmentLog},
    collector::JsonFileSource,
    config::Config,
    core::{OverallRiskAssessment, RiskEngine},
    store::{AssessmentStore, JsonFileStore},
    ASSESSMENT_DISCLAIMER, VERSION,
};

#[cfg(feature = "gateway")]
use wellbeing_risk_engine::{BlockingGatewayClient, GatewayConfig};

#[derive(Parser)]
#[command(name = "wellbeing-risk")]
#[command(version = VERSION)]
#[command(about = "Wellbeing risk assessments from activity and mood history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Default)]
struct StoreArgs {
    /// Do not persist the assessment
    #[arg(long)]
    no_save: bool,

    /// Gateway port for remote storage (requires gateway feature)
    #[arg(long)]
    gateway_port: Option<u16>,

    /// Gateway bearer token (requires gateway feature)
    #[arg(long)]
    gateway_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute an assessment for a user now
    Assess {
        /// User to assess
        #[arg(long)]
        user: String,

        /// Print the full assessment as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Reassess users on a fixed interval until Ctrl+C
    Watch {
        /// Users to assess (repeatable)
        #[arg(long = "user", required = true)]
        users: Vec<String>,

        /// Seconds between runs (defaults to the configured interval)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show the last stored assessment for a user
    Latest {
        #[arg(long)]
        user: String,

        /// Show every stored assessment, oldest first
        #[arg(long)]
        all: bool,
    },

    /// Show configuration and cumulative statistics
    Status,

    /// Display what the assessments use and what they are not
    Disclaimer,

    /// Show configuration
    Config,

    /// Serve assessments over HTTP (requires server feature)
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(long, default_value = "8787")]
        port: u16,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assess { user, json, store } => cmd_assess(&user, json, &store),
        Commands::Watch {
            users,
            interval_secs,
            store,
        } => cmd_watch(&users, interval_secs, &store),
        Commands::Latest { user, all } => cmd_latest(&user, all),
        Commands::Status => cmd_status(),
        Commands::Disclaimer => {
            println!("{ASSESSMENT_DISCLAIMER}");
            Ok(())
        }
        Commands::Config => cmd_config(),
        #[cfg(feature = "server")]
        Commands::Serve { port } => cmd_serve(port),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("loading configuration")?;
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    Ok(config)
}

fn build_engine(config: &Config) -> anyhow::Result<RiskEngine<JsonFileSource>> {
    let tz = config.tz()?;
    let source = JsonFileSource::new(&config.data_path, tz);
    Ok(RiskEngine::new(source, config.engine_settings()))
}

/// Pick the store: remote gateway when configured, local JSON files otherwise.
fn open_store(config: &Config, args: &StoreArgs) -> anyhow::Result<Option<Box<dyn AssessmentStore>>> {
    if args.no_save {
        return Ok(None);
    }

    #[cfg(feature = "gateway")]
    match (args.gateway_port, args.gateway_token.clone()) {
        (Some(port), Some(token)) => {
            let client = BlockingGatewayClient::new(GatewayConfig::new("127.0.0.1", port, token))?;
            match client.test_connection() {
                Ok(true) => println!("Gateway connection: OK"),
                Ok(false) => eprintln!("Warning: Gateway health check failed"),
                Err(e) => eprintln!("Warning: Could not connect to gateway: {e}"),
            }
            return Ok(Some(Box::new(client)));
        }
        (None, None) => {}
        _ => eprintln!(
            "Warning: gateway flags ignored (--gateway-port and --gateway-token must be given together)"
        ),
    }

    #[cfg(not(feature = "gateway"))]
    if args.gateway_port.is_some() || args.gateway_token.is_some() {
        eprintln!("Warning: gateway flags ignored (gateway feature not enabled at compile time)");
    }

    Ok(Some(Box::new(JsonFileStore::new(&config.store_path))))
}

/// Assess one user, then save, alert, and count.
fn run_assessment(
    engine: &RiskEngine<JsonFileSource>,
    store: Option<&dyn AssessmentStore>,
    log: &SharedAssessmentLog,
    config: &Config,
    user: &str,
) -> anyhow::Result<OverallRiskAssessment> {
    let assessment = match engine.assess(user) {
        Ok(a) => a,
        Err(e) => {
            log.record_failure();
            return Err(e).with_context(|| format!("assessing {user}"));
        }
    };
    log.record_assessment(assessment.overall_level);

    if let Some(store) = store {
        let result = store.save_assessment(&assessment);
        log.record_save(result.success);
        match (result.success, result.id, result.error) {
            (true, Some(id), _) => println!("Saved assessment {id}"),
            (true, None, _) => println!("Saved assessment"),
            (false, _, error) => eprintln!(
                "Warning: assessment was computed but not saved: {}",
                error.unwrap_or_else(|| "unknown error".to_string())
            ),
        }
    }

    if config.alerts_enabled {
        match dispatch_alert(&TracingAlertSink, &assessment) {
            Ok(true) => log.record_alert(),
            Ok(false) => {}
            Err(e) => eprintln!("Warning: alert delivery failed: {e}"),
        }
    }

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save statistics: {e}");
    }

    Ok(assessment)
}

fn print_assessment(assessment: &OverallRiskAssessment) {
    println!(
        "[{}] {} overall: {}",
        assessment.assessment_date.format("%Y-%m-%d %H:%M:%S"),
        assessment.user_id,
        assessment.overall_level
    );
    let rows = [
        ("Fall", assessment.fall_risk.level, assessment.fall_risk.score, &assessment.fall_risk.factors),
        (
            "Frailty",
            assessment.frailty_risk.level,
            assessment.frailty_risk.score,
            &assessment.frailty_risk.factors,
        ),
        (
            "Mental health",
            assessment.mental_health_risk.level,
            assessment.mental_health_risk.score,
            &assessment.mental_health_risk.factors,
        ),
    ];
    for (name, level, score, factors) in rows {
        println!("  {name}: {level} ({score}/100)");
        for factor in factors {
            println!("    - {factor}");
        }
    }
    println!("  Recommendations:");
    for rec in &assessment.recommendations {
        println!("    • {rec}");
    }
    println!(
        "  Next assessment: {}",
        assessment.next_assessment_date.format("%Y-%m-%d %H:%M")
    );
}

fn cmd_assess(user: &str, json: bool, store_args: &StoreArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;
    let store = open_store(&config, store_args)?;
    let log = create_shared_log_with_persistence(config.audit_log_path());

    let assessment = run_assessment(&engine, store.as_deref(), &log, &config, user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print_assessment(&assessment);
    }
    Ok(())
}

fn cmd_watch(users: &[String], interval_secs: Option<u64>, store_args: &StoreArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let engine = build_engine(&config)?;
    let store = open_store(&config, store_args)?;
    let log = create_shared_log_with_persistence(config.audit_log_path());

    let interval = interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.reassessment_interval);
    if interval.is_zero() {
        anyhow::bail!("reassessment interval must be at least one second");
    }

    println!("Wellbeing Risk Engine v{VERSION}");
    println!("  Users: {}", users.join(", "));
    println!("  Interval: {}s", interval.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("setting Ctrl+C handler")?;

    let ticker = tick(interval);
    loop {
        for user in users {
            match run_assessment(&engine, store.as_deref(), &log, &config, user) {
                Ok(assessment) => print_assessment(&assessment),
                // Keep the schedule running; the next tick retries this user
                Err(e) => eprintln!("Error: {e:#}"),
            }
        }

        select! {
            recv(ticker) -> _ => continue,
            recv(shutdown_rx) -> _ => break,
        }
    }

    println!();
    println!("{}", log.summary());
    Ok(())
}

fn cmd_latest(user: &str, all: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = JsonFileStore::new(&config.store_path);

    if all {
        let history = store
            .history(user)
            .with_context(|| format!("reading stored assessments for {user}"))?;
        if history.is_empty() {
            println!("{user}: unknown (no stored assessment)");
        }
        for assessment in &history {
            print_assessment(assessment);
            println!();
        }
        return Ok(());
    }

    match store.latest_assessment(user) {
        Ok(Some(assessment)) => print_assessment(&assessment),
        Ok(None) => println!("{user}: unknown (no stored assessment)"),
        Err(e) => {
            eprintln!("Warning: Could not read stored assessment: {e}");
            println!("{user}: unknown");
        }
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Wellbeing Risk Engine Status");
    println!("============================");
    println!();
    println!("Configuration:");
    println!("  History path: {:?}", config.data_path);
    println!("  Store path: {:?}", config.store_path);
    println!("  Step target: {}", config.step_target);
    println!("  Timezone: {}", config.timezone);
    println!(
        "  Reassessment interval: {} days",
        config.reassessment_interval.as_secs() / 86_400
    );
    println!(
        "  Alerts: {}",
        if config.alerts_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();

    if config.audit_log_path().exists() {
        let log = create_shared_log_with_persistence(config.audit_log_path());
        let stats = log.stats();
        println!("Cumulative Statistics:");
        println!(
            "  Assessments computed: {} (low {}, medium {}, high {})",
            stats.assessments_computed, stats.low, stats.medium, stats.high
        );
        println!("  Assessments failed: {}", stats.failed);
        println!("  Saves failed: {}", stats.saves_failed);
        println!("  Alerts raised: {}", stats.alerts_raised);
    } else {
        println!("No previous assessment data found.");
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) -> anyhow::Result<()> {
    use std::sync::Arc;
    use wellbeing_risk_engine::server::{run, ServerConfig};

    let config = load_config()?;
    let log = create_shared_log_with_persistence(config.audit_log_path());
    let store: Arc<dyn AssessmentStore> = Arc::new(JsonFileStore::new(&config.store_path));

    let mut server_config = ServerConfig::new(port, store, log.clone());
    server_config.default_step_target = config.step_target;
    server_config.dispatch = config.engine_settings().dispatch;
    if config.alerts_enabled {
        server_config = server_config.with_alert_sink(Arc::new(TracingAlertSink));
    }

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    runtime.block_on(async move {
        let (addr, shutdown_tx) = run(server_config).await?;
        println!("Listening on http://{addr}");
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        anyhow::Ok(())
    })?;

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save statistics: {e}");
    }
    println!("{}", log.summary());
    Ok(())
}
