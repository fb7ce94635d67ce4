//! Giftswap - gift-exchange draws from the command line
//!
//! The `giftswap` command keeps rosters and draws in a single JSON file.
//!
//! ## Commands
//!
//! - `roster set` / `roster show`: manage a cohort's members and partner links
//! - `draw`: draw assignments for a cohort and period
//! - `relaunch`: replace an existing draw
//! - `cancel`: delete an existing draw
//! - `show`: print a draw, or one giver's receiver
//! - `audit`: re-check a stored draw against the current roster and history

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use giftswap_core::metrics::METRICS;
use giftswap_core::{
    AssignmentVerdict, CohortId, CoordinatorConfig, CoordinatorError, DrawRecord,
    ExchangeCoordinator, ExchangeError, GiverOrder, InputError, LogFormat, LookbackWindow,
    ParticipantId, Period, RandomSource, RelaunchMode, RelaunchPolicy, SearchConfig,
    SeededRandom, ThreadRandom, DEFAULT_MAX_ATTEMPTS,
};
use giftswap_state::{JsonFileStore, ParticipantRecord, RosterProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

type Coordinator =
    ExchangeCoordinator<Arc<JsonFileStore>, Arc<JsonFileStore>, Arc<JsonFileStore>>;

#[derive(Parser)]
#[command(name = "giftswap")]
#[command(author = "Giftswap Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gift-exchange draws with partner and history exclusions", long_about = None)]
struct Cli {
    /// Path to the JSON store
    #[arg(long, global = true, env = "GIFTSWAP_STORE", default_value = "giftswap.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and JSON command output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cohort rosters
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },

    /// Draw assignments for a period that has none yet
    Draw {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Replace the draw for a period
    Relaunch {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        search: SearchArgs,

        /// Keep the old draw if the new one fails (transactional) or drop it first (lossy)
        #[arg(long, value_enum, default_value_t = ModeArg::Transactional)]
        relaunch_mode: ModeArg,

        /// Forbid the pairs of the draw being replaced
        #[arg(long)]
        exclude_previous: bool,
    },

    /// Delete the draw for a period
    Cancel {
        #[command(flatten)]
        target: Target,
    },

    /// Print the draw for a period
    Show {
        #[command(flatten)]
        target: Target,

        /// Only print who this participant gives to
        #[arg(long)]
        giver: Option<String>,
    },

    /// Re-check a stored draw against the current roster and history
    Audit {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        lookback: LookbackArgs,
    },
}

#[derive(Subcommand)]
enum RosterAction {
    /// Set a cohort's members (replaces any existing roster)
    Set {
        cohort: String,

        /// Members as `id` or `id:partner`
        #[arg(required = true, value_parser = parse_member)]
        members: Vec<ParticipantRecord>,
    },

    /// Print a cohort's members
    Show { cohort: String },
}

#[derive(Args, Debug, Clone)]
struct Target {
    /// Cohort to operate on
    cohort: String,

    /// Exchange period (default: current year)
    #[arg(short, long)]
    period: Option<Period>,
}

impl Target {
    fn cohort_id(&self) -> CohortId {
        CohortId::new(self.cohort.as_str())
    }

    fn period(&self) -> Period {
        self.period.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Attempts before giving up
    #[arg(long, env = "GIFTSWAP_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Seed for a reproducible draw
    #[arg(long, env = "GIFTSWAP_SEED")]
    seed: Option<u64>,

    /// Order in which givers pick
    #[arg(long, value_enum, default_value_t = OrderArg::Roster)]
    giver_order: OrderArg,

    #[command(flatten)]
    lookback: LookbackArgs,
}

impl SearchArgs {
    fn search_config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_giver_order(self.giver_order.into())
    }

    fn rng(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom::new()),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
struct LookbackArgs {
    /// Forbid pairs drawn since January 1 of this many years ago (default: 2)
    #[arg(long, conflicts_with_all = ["lookback_days", "all_history"])]
    lookback_years: Option<u32>,

    /// Forbid pairs drawn in this many days
    #[arg(long, conflicts_with = "all_history")]
    lookback_days: Option<u32>,

    /// Forbid every pair ever drawn
    #[arg(long)]
    all_history: bool,
}

impl LookbackArgs {
    fn window(&self) -> LookbackWindow {
        if self.all_history {
            LookbackWindow::Unbounded
        } else if let Some(days) = self.lookback_days {
            LookbackWindow::RollingDays { days }
        } else if let Some(years) = self.lookback_years {
            LookbackWindow::CalendarYears { years }
        } else {
            LookbackWindow::default()
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OrderArg {
    Roster,
    Shuffled,
    MostConstrained,
}

impl From<OrderArg> for GiverOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Roster => GiverOrder::Roster,
            OrderArg::Shuffled => GiverOrder::Shuffled,
            OrderArg::MostConstrained => GiverOrder::MostConstrainedFirst,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ModeArg {
    Transactional,
    Lossy,
}

impl From<ModeArg> for RelaunchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Transactional => RelaunchMode::Transactional,
            ModeArg::Lossy => RelaunchMode::Lossy,
        }
    }
}

fn parse_member(s: &str) -> std::result::Result<ParticipantRecord, String> {
    let (id, partner) = match s.split_once(':') {
        Some((id, partner)) => (id.trim(), Some(partner.trim())),
        None => (s.trim(), None),
    };
    if id.is_empty() {
        return Err(format!("member `{s}` has an empty id"));
    }
    match partner {
        Some("") => Err(format!("member `{s}` has an empty partner")),
        Some(partner) => Ok(ParticipantRecord::new(id).with_partner(partner)),
        None => Ok(ParticipantRecord::new(id)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    giftswap_core::init_tracing(format, level);

    let store = Arc::new(
        JsonFileStore::open(&cli.store)
            .with_context(|| format!("failed to open store {}", cli.store.display()))?,
    );
    let json = cli.json;

    let result = match cli.command {
        Commands::Roster { action } => match action {
            RosterAction::Set { cohort, members } => {
                cmd_roster_set(&store, &cohort, members, json)
            }
            RosterAction::Show { cohort } => cmd_roster_show(&store, &cohort, json).await,
        },
        Commands::Draw { target, search } => cmd_draw(&store, &target, &search, json).await,
        Commands::Relaunch {
            target,
            search,
            relaunch_mode,
            exclude_previous,
        } => {
            let policy = RelaunchPolicy {
                mode: relaunch_mode.into(),
                exclude_previous_draw: exclude_previous,
            };
            cmd_relaunch(&store, &target, &search, policy, json).await
        }
        Commands::Cancel { target } => cmd_cancel(&store, &target, json).await,
        Commands::Show { target, giver } => {
            cmd_show(&store, &target, giver.as_deref(), json).await
        }
        Commands::Audit { target, lookback } => cmd_audit(&store, &target, &lookback, json).await,
    };

    if cli.verbose {
        METRICS.flush();
    }
    result
}

fn coordinator(store: &Arc<JsonFileStore>, config: CoordinatorConfig) -> Coordinator {
    ExchangeCoordinator::new(store.clone(), store.clone(), store.clone(), config)
}

/// Attach a hint that tells the user what to change.
fn explain(err: CoordinatorError) -> anyhow::Error {
    let hint = match &err {
        CoordinatorError::Exchange(e) if e.is_retryable() => {
            "no valid draw found; try again, raise --max-attempts, or shorten the lookback window"
        }
        CoordinatorError::Exchange(ExchangeError::InvalidInput(InputError::ZeroAttemptBudget)) => {
            "pass --max-attempts 1 or more"
        }
        CoordinatorError::Exchange(_) => "fix the roster with `giftswap roster set`",
        CoordinatorError::AlreadyDrawn { .. } => "use `giftswap relaunch` to replace it",
        CoordinatorError::NoDraw { .. } => "use `giftswap draw` first",
        CoordinatorError::Storage(_) => "storage operation failed",
    };
    anyhow::Error::new(err).context(hint)
}

// ========== Roster Commands ==========

fn cmd_roster_set(
    store: &Arc<JsonFileStore>,
    cohort: &str,
    members: Vec<ParticipantRecord>,
    json: bool,
) -> Result<()> {
    let count = members.len();
    store
        .set_roster(CohortId::new(cohort), members)
        .with_context(|| format!("failed to write {}", store.path().display()))?;
    info!(cohort = %cohort, members = count, "roster saved");

    if json {
        println!("{}", serde_json::json!({ "cohort": cohort, "members": count }));
    } else {
        println!("Saved {} member(s) for {}", count, cohort);
    }
    Ok(())
}

async fn cmd_roster_show(store: &Arc<JsonFileStore>, cohort: &str, json: bool) -> Result<()> {
    let members = store
        .roster(&CohortId::new(cohort))
        .await
        .with_context(|| format!("failed to read roster for {}", cohort))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }
    for member in members {
        match member.partner_id {
            Some(partner) => println!("{} (partner: {})", member.id, partner),
            None => println!("{}", member.id),
        }
    }
    Ok(())
}

// ========== Draw Commands ==========

async fn cmd_draw(
    store: &Arc<JsonFileStore>,
    target: &Target,
    search: &SearchArgs,
    json: bool,
) -> Result<()> {
    let config = CoordinatorConfig {
        search: search.search_config(),
        lookback: search.lookback.window(),
        ..CoordinatorConfig::default()
    };
    let mut rng = search.rng();
    let record = coordinator(store, config)
        .launch(&target.cohort_id(), target.period(), Utc::now(), rng.as_mut())
        .await
        .map_err(explain)?;

    print_draw(&record, json)
}

async fn cmd_relaunch(
    store: &Arc<JsonFileStore>,
    target: &Target,
    search: &SearchArgs,
    policy: RelaunchPolicy,
    json: bool,
) -> Result<()> {
    let config = CoordinatorConfig {
        search: search.search_config(),
        lookback: search.lookback.window(),
        relaunch: policy,
    };
    let mut rng = search.rng();
    let record = coordinator(store, config)
        .relaunch(&target.cohort_id(), target.period(), Utc::now(), rng.as_mut())
        .await
        .map_err(explain)?;

    print_draw(&record, json)
}

async fn cmd_cancel(store: &Arc<JsonFileStore>, target: &Target, json: bool) -> Result<()> {
    let removed = coordinator(store, CoordinatorConfig::default())
        .cancel(&target.cohort_id(), target.period())
        .await
        .map_err(explain)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "cancelled": removed.draw_id,
                "cohort": removed.cohort_id,
                "period": removed.period,
            })
        );
    } else {
        println!(
            "Cancelled draw {} for {} {}",
            removed.draw_id, removed.cohort_id, removed.period
        );
    }
    Ok(())
}

async fn cmd_show(
    store: &Arc<JsonFileStore>,
    target: &Target,
    giver: Option<&str>,
    json: bool,
) -> Result<()> {
    let coordinator = coordinator(store, CoordinatorConfig::default());
    let cohort_id = target.cohort_id();
    let period = target.period();

    let Some(giver) = giver else {
        let record = coordinator
            .current(&cohort_id, period)
            .await
            .map_err(explain)?;
        return print_draw(&record, json);
    };

    let receiver = coordinator
        .receiver_for(&cohort_id, period, &ParticipantId::new(giver))
        .await
        .map_err(explain)?;
    let Some(receiver) = receiver else {
        bail!("{} is not part of the {} draw for {}", giver, cohort_id, period);
    };

    if json {
        println!(
            "{}",
            serde_json::json!({ "giver_id": giver, "receiver_id": receiver })
        );
    } else {
        println!("{} -> {}", giver, receiver);
    }
    Ok(())
}

async fn cmd_audit(
    store: &Arc<JsonFileStore>,
    target: &Target,
    lookback: &LookbackArgs,
    json: bool,
) -> Result<()> {
    let config = CoordinatorConfig {
        lookback: lookback.window(),
        ..CoordinatorConfig::default()
    };
    let verdict = coordinator(store, config)
        .audit(&target.cohort_id(), target.period(), Utc::now())
        .await
        .map_err(explain)?;

    print_verdict(&verdict, json)?;
    if !verdict.passed() {
        bail!(
            "draw for {} {} failed audit with {} violation(s)",
            target.cohort,
            target.period(),
            verdict.violations.len()
        );
    }
    Ok(())
}

// ========== Output ==========

fn print_draw(record: &DrawRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!(
        "Draw {} for {} {} ({})",
        record.draw_id,
        record.cohort_id,
        record.period,
        record.created_at.to_rfc3339()
    );
    for pair in &record.pairs {
        println!("  {} -> {}", pair.giver_id, pair.receiver_id);
    }
    Ok(())
}

fn print_verdict(verdict: &AssignmentVerdict, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
    } else if verdict.passed() {
        println!("Draw passes every rule");
    } else {
        for violation in &verdict.violations {
            println!("  {}", serde_json::to_string(violation)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftswap_state::AssignmentStore;

    fn open_store(dir: &tempfile::TempDir) -> Arc<JsonFileStore> {
        Arc::new(JsonFileStore::open(dir.path().join("giftswap.json")).unwrap())
    }

    fn target(period: Period) -> Target {
        Target {
            cohort: "family".to_string(),
            period: Some(period),
        }
    }

    fn seeded(seed: u64) -> SearchArgs {
        SearchArgs {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: Some(seed),
            giver_order: OrderArg::Roster,
            lookback: LookbackArgs::default(),
        }
    }

    fn members(specs: &[&str]) -> Vec<ParticipantRecord> {
        specs.iter().map(|s| parse_member(s).unwrap()).collect()
    }

    #[test]
    fn test_parse_member() {
        assert_eq!(parse_member("ana").unwrap(), ParticipantRecord::new("ana"));
        assert_eq!(
            parse_member("ana:ben").unwrap(),
            ParticipantRecord::new("ana").with_partner("ben")
        );
        assert!(parse_member(":ben").is_err());
        assert!(parse_member("ana:").is_err());
    }

    #[test]
    fn test_cli_parses_draw_arguments() {
        let cli = Cli::try_parse_from([
            "giftswap",
            "--store",
            "/tmp/x.json",
            "draw",
            "family",
            "--period",
            "2025",
            "--max-attempts",
            "7",
            "--giver-order",
            "most-constrained",
            "--lookback-days",
            "365",
        ])
        .unwrap();

        assert_eq!(cli.store, PathBuf::from("/tmp/x.json"));
        let Commands::Draw { target, search } = cli.command else {
            panic!("expected draw");
        };
        assert_eq!(target.period(), 2025);
        let config = search.search_config();
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.giver_order, GiverOrder::MostConstrainedFirst);
        assert_eq!(search.lookback.window(), LookbackWindow::RollingDays { days: 365 });
    }

    #[test]
    fn test_lookback_flags_conflict() {
        let result = Cli::try_parse_from([
            "giftswap",
            "audit",
            "family",
            "--lookback-years",
            "1",
            "--all-history",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_roster_set_requires_members() {
        assert!(Cli::try_parse_from(["giftswap", "roster", "set", "family"]).is_err());
    }

    #[tokio::test]
    async fn test_roster_set_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        cmd_roster_set(&store, "family", members(&["ana:ben", "ben:ana", "cal"]), false).unwrap();
        cmd_roster_show(&store, "family", false).await.unwrap();

        let roster = store.roster(&CohortId::new("family")).await.unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].partner_id.as_deref(), Some("ben"));
    }

    #[tokio::test]
    async fn test_draw_show_cancel_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana:ben", "ben:ana", "cal", "dan"]), false)
            .unwrap();

        cmd_draw(&store, &target(2025), &seeded(1), false).await.unwrap();
        cmd_show(&store, &target(2025), None, true).await.unwrap();
        cmd_show(&store, &target(2025), Some("cal"), false).await.unwrap();
        cmd_audit(&store, &target(2025), &LookbackArgs::default(), false)
            .await
            .unwrap();

        let again = cmd_draw(&store, &target(2025), &seeded(2), false).await;
        assert!(again.is_err(), "second draw for the same period must fail");

        cmd_cancel(&store, &target(2025), false).await.unwrap();
        assert!(store.get(&CohortId::new("family"), 2025).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_show_unknown_giver_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana", "ben"]), false).unwrap();
        cmd_draw(&store, &target(2025), &seeded(3), false).await.unwrap();

        let err = cmd_show(&store, &target(2025), Some("zoe"), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("zoe"));
    }

    #[tokio::test]
    async fn test_relaunch_replaces_draw() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana", "ben", "cal", "dan"]), false).unwrap();
        cmd_draw(&store, &target(2025), &seeded(4), false).await.unwrap();
        let before = store.get(&CohortId::new("family"), 2025).await.unwrap().unwrap();

        cmd_relaunch(
            &store,
            &target(2025),
            &seeded(5),
            RelaunchPolicy::default(),
            false,
        )
        .await
        .unwrap();

        let after = store.get(&CohortId::new("family"), 2025).await.unwrap().unwrap();
        assert_ne!(before.draw_id, after.draw_id);
    }

    #[tokio::test]
    async fn test_exhausted_draw_explains_itself() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana:ben", "ben:ana"]), false).unwrap();

        let err = cmd_draw(&store, &target(2025), &seeded(6), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no valid draw found"));
        assert!(store.get(&CohortId::new("family"), 2025).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_points_at_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana", "ben", "cal"]), false).unwrap();

        let search = SearchArgs {
            max_attempts: 0,
            ..seeded(1)
        };
        let err = cmd_draw(&store, &target(2025), &search, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--max-attempts"));
        assert!(!err.to_string().contains("roster"));
    }

    #[tokio::test]
    async fn test_audit_fails_after_roster_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        cmd_roster_set(&store, "family", members(&["ana", "ben"]), false).unwrap();
        cmd_draw(&store, &target(2025), &seeded(7), false).await.unwrap();

        cmd_roster_set(&store, "family", members(&["ana:ben", "ben:ana"]), false).unwrap();
        let result = cmd_audit(&store, &target(2025), &LookbackArgs::default(), true).await;
        assert!(result.is_err());
    }
}
