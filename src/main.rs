use chrono::{DateTime, Local};
use log::error;

use minigame_progress::game::{GameServices, ProgressLedger, Settings};
use minigame_progress::model::LevelContent;

const DEFAULT_USER: &str = "guest";

fn init_logging() {
    env_logger::init();
}

fn print_game<C: LevelContent>(title: &str, ledger: &mut ProgressLedger<C>, user_id: &str) {
    let record = ledger.get_progress(user_id);
    let unlocked: Vec<String> = ledger
        .unlocked_levels(user_id)
        .iter()
        .map(|level| level.id.clone())
        .collect();
    let last_played: DateTime<Local> = record.last_played.into();

    println!(
        "{title}: {} points, {} hints, {}/{} levels (last played {})",
        record.total_score,
        record.unlocked_hints,
        record.completed_count(),
        ledger.levels().len(),
        last_played.format("%Y-%m-%d %H:%M"),
    );

    for level in ledger.levels() {
        let status = if record.has_completed(&level.id) {
            "done"
        } else if unlocked.contains(&level.id) {
            "open"
        } else {
            "locked"
        };
        let best = record
            .best_times
            .get(&level.id)
            .map(|seconds| format!(" best {seconds}s"))
            .unwrap_or_default();
        println!(
            "  [{status:>6}] {} {} ({}, {} items){best}",
            level.id,
            level.name,
            level.difficulty,
            level.content.item_count(),
        );
    }
}

fn main() {
    init_logging();

    let settings = Settings::load();
    let mut services = match GameServices::open(&settings) {
        Ok(services) => services,
        Err(err) => {
            error!("Could not open game storage: {}", err);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--reset") {
        services.reset_all();
        println!("All progress cleared.");
        return;
    }
    let user_id = args.first().map(String::as_str).unwrap_or(DEFAULT_USER);

    if Settings::is_debug_mode() {
        println!("Storage keys: {:?}", services.store().get_all_keys());
    }

    print_game("Word chain", &mut services.word_chain, user_id);
    print_game("Spot the difference", &mut services.spot_difference, user_id);
    print_game("Puzzle", &mut services.puzzle, user_id);
}
