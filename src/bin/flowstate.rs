use flowstate::config::CoreConfig;
use flowstate::db::queries;
use flowstate::progress::{sync_xp_from_history, total_xp, DailyRecord};
use flowstate::state::{snapshot, AppState};
use flowstate::{activate, deactivate, init_tracing, Core};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Status { json: bool },
    Reset,
    LogDay(DailyRecord),
    SyncXp,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let Some(name) = args.next() else {
            return Ok(Some(Self::Status { json: false }));
        };
        let command = match name.as_str() {
            "--help" | "-h" | "help" => return Ok(None),
            "status" => Self::Status {
                json: matches!(args.next().as_deref(), Some("--json")),
            },
            "reset" => Self::Reset,
            "sync-xp" => Self::SyncXp,
            "log-day" => {
                let date = args
                    .next()
                    .ok_or_else(|| "log-day requires <date> <minutes> <score>".to_string())?;
                let minutes = args
                    .next()
                    .ok_or_else(|| "log-day requires <minutes>".to_string())?
                    .parse::<u32>()
                    .map_err(|e| format!("invalid minutes: {e}"))?;
                let average_score = args
                    .next()
                    .ok_or_else(|| "log-day requires <score>".to_string())?
                    .parse::<f64>()
                    .map_err(|e| format!("invalid score: {e}"))?;
                chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|e| format!("invalid date '{date}': {e}"))?;
                Self::LogDay(DailyRecord {
                    date,
                    minutes,
                    average_score: average_score.clamp(0.0, 100.0),
                })
            }
            other => return Err(format!("unknown command '{other}'. Run with --help")),
        };
        Ok(Some(command))
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    if let Err(error) = run().await {
        eprintln!("flowstate failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let Some(command) = Command::parse(std::env::args().skip(1))? else {
        print_help();
        return Ok(());
    };

    let config = CoreConfig::from_env().map_err(|e| e.to_string())?;
    let core = activate(config).await.map_err(|e| e.to_string())?;

    let result = execute(&core, command).await;
    deactivate(&core).await;
    result
}

async fn execute(core: &Core, command: Command) -> Result<(), String> {
    match command {
        Command::Status { json: true } => {
            let encoded =
                snapshot::encode(&core.manager.get_state()).map_err(|e| e.to_string())?;
            println!("{encoded}");
        }
        Command::Status { json: false } => print_status(core, &core.manager.get_state()),
        Command::Reset => {
            core.manager.reset().await;
            println!("state reset to defaults");
        }
        Command::LogDay(record) => {
            let now = chrono::Utc::now().to_rfc3339();
            queries::upsert_daily_record(&core.db, &record, &now).map_err(|e| e.to_string())?;
            println!("recorded {} minutes on {}", record.minutes, record.date);
            sync_from_history(core)?;
        }
        Command::SyncXp => sync_from_history(core)?,
    }
    Ok(())
}

fn sync_from_history(core: &Core) -> Result<(), String> {
    let history = queries::list_daily_records(&core.db).map_err(|e| e.to_string())?;
    let xp = sync_xp_from_history(&core.manager, core.manager.bus(), &history);
    println!(
        "{} day(s) of history, {} XP total, level {}",
        history.len(),
        total_xp(&history),
        xp.level()
    );
    Ok(())
}

fn print_status(core: &Core, state: &AppState) {
    println!("data dir:     {}", core.config.data_dir.display());
    println!("load:         {:?}", core.load_outcome);
    println!(
        "level:        {} ({}/{} XP, {} total)",
        state.xp.level(),
        state.xp.xp_in_level(),
        state.xp.xp_to_next(),
        state.xp.total_xp()
    );
    println!(
        "pomodoros:    {} today, {} total",
        state.pomodoro.today_count, state.pomodoro.total_count
    );
    println!(
        "goals:        {}/{} min{}",
        state.goals.done_minutes,
        state.goals.targets.focus_minutes,
        if state.goals.all_done { ", all done" } else { "" }
    );
    println!("achievements: {}", state.achievements.unlocked.len());
    println!(
        "session:      {} file(s), {} edits, {} switches",
        state.session.files_worked.len(),
        state.session.total_edits,
        state.session.total_switches
    );
}

fn print_help() {
    println!(
        "flowstate\n\n\
         USAGE:\n  flowstate [COMMAND]\n\n\
         COMMANDS:\n  \
         status [--json]                  Show the persisted state (default)\n  \
         reset                            Restore factory defaults\n  \
         log-day <date> <minutes> <score> Record a day of focus and resync XP\n  \
         sync-xp                          Recompute XP from recorded history\n\n\
         ENVIRONMENT:\n  \
         FLOWSTATE_DATA_DIR, FLOWSTATE_SETTINGS_KEY,\n  \
         FLOWSTATE_PERSIST_DELAY_MS, FLOWSTATE_PERSIST_MAX_WAIT_MS, FLOWSTATE_LOG"
    );
}
