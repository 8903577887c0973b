use clap::Parser;
use neon_snake_server::engine::GameEngine;
use neon_snake_server::grid::Grid;
use neon_snake_server::movement;
use neon_snake_server::types::{Direction, GameConfig, RunState, RuntimeEvent, Snapshot, Vec2};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    runs: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    lenient_tail: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunEndReason {
    GameOver,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    ticks: u64,
    score: i32,
    level: i32,
    #[serde(rename = "foodEaten")]
    food_eaten: i32,
    #[serde(rename = "levelUps")]
    level_ups: i32,
    #[serde(rename = "finalTickMs")]
    final_tick_ms: u64,
    reason: RunEndReason,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunOutcome {
    #[serde(flatten)]
    result: RunResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct BatchSummary {
    #[serde(rename = "batchId")]
    batch_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "bestScore")]
    best_score: i32,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "batchId")]
    batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let run_count = cli.runs.unwrap_or(3).clamp(1, 1000);
    let base_seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let max_ticks = cli.max_ticks.unwrap_or(50_000).clamp(1, 10_000_000);
    let config = GameConfig {
        strict_tail_collision: !cli.lenient_tail,
        ..GameConfig::default()
    };

    let batch_started_at_ms = now_ms();
    let batch_id = format!("sim-{base_seed}-{batch_started_at_ms}");
    let mut has_anomaly = false;
    let mut run_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;
    let mut best_score = 0i32;

    for run in 0..run_count {
        let seed = base_seed.wrapping_add(run);
        emit_log(
            "info",
            "run_started",
            &batch_id,
            Some(run),
            Some(seed),
            None,
            json!({
                "maxTicks": max_ticks,
                "strictTailCollision": config.strict_tail_collision,
            }),
        );

        let outcome = run_once(&config, run, seed, max_ticks);

        for anomaly in &outcome.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &batch_id,
                Some(run),
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !outcome.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += outcome.anomaly_records.len();
        total_ticks += outcome.result.ticks;
        best_score = best_score.max(outcome.result.score);
        *reason_counts
            .entry(reason_key(outcome.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "run_finished",
            &batch_id,
            Some(run),
            Some(seed),
            Some(outcome.result.ticks),
            json!({
                "reason": outcome.result.reason,
                "score": outcome.result.score,
                "level": outcome.result.level,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&outcome.result).expect("run result should serialize")
        );
        run_results.push(outcome.result);
    }

    let batch_finished_at_ms = now_ms();
    let summary = build_batch_summary(
        batch_id.clone(),
        batch_started_at_ms,
        batch_finished_at_ms,
        run_results,
        reason_counts,
        total_anomalies,
        total_ticks,
        best_score,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &batch_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "batch_finished",
        &batch_id,
        None,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "bestScore": summary.best_score,
            "averageTicks": summary.average_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_once(config: &GameConfig, run: u32, seed: u32, max_ticks: u64) -> RunOutcome {
    let grid = Grid::from_config(config);
    let mut engine = GameEngine::new(config.clone(), seed);
    engine.start();

    let mut food_eaten = 0;
    let mut level_ups = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut reason = RunEndReason::TickLimit;

    for _ in 0..max_ticks {
        let steer = {
            let snapshot = engine.build_snapshot(false);
            choose_direction(&snapshot, &grid)
        };
        engine.set_direction(steer);
        engine.tick();

        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in collect_snapshot_anomalies(&snapshot, config) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::FoodEaten { .. } => food_eaten += 1,
                RuntimeEvent::LevelUp { .. } => level_ups += 1,
                _ => {}
            }
        }

        if snapshot.run_state == RunState::GameOver {
            reason = RunEndReason::GameOver;
            break;
        }
    }

    let final_snapshot = engine.build_snapshot(false);
    let (score, level) = engine
        .final_result()
        .unwrap_or((final_snapshot.score, final_snapshot.level));

    RunOutcome {
        result: RunResultLine {
            run,
            seed,
            ticks: last_tick,
            score,
            level,
            food_eaten,
            level_ups,
            final_tick_ms: final_snapshot.tick_ms,
            reason,
            anomalies,
        },
        anomaly_records,
    }
}

fn choose_direction(snapshot: &Snapshot, grid: &Grid) -> Direction {
    let Some(head) = snapshot.snake.first().copied() else {
        return snapshot.direction;
    };
    let mut candidates = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
    candidates.sort_by_key(|dir| manhattan(movement::offset(head, *dir), snapshot.food));

    for dir in candidates {
        if dir == snapshot.direction.opposite() {
            continue;
        }
        let next = movement::offset(head, dir);
        if !grid.contains(next) {
            continue;
        }
        if snapshot.snake.contains(&next) {
            continue;
        }
        return dir;
    }
    snapshot.direction
}

fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, config: &GameConfig) -> Vec<String> {
    let mut anomalies = Vec::new();

    let unique: HashSet<Vec2> = snapshot.snake.iter().copied().collect();
    if unique.len() != snapshot.snake.len() {
        anomalies.push(format!(
            "snake overlaps itself: {} cells, {} distinct",
            snapshot.snake.len(),
            unique.len()
        ));
    }

    if snapshot.run_state != RunState::GameOver && snapshot.snake.contains(&snapshot.food) {
        anomalies.push(format!(
            "food spawned on the snake at ({}, {})",
            snapshot.food.x, snapshot.food.y
        ));
    }

    if config.points_per_food > 0 && snapshot.score % config.points_per_food != 0 {
        anomalies.push(format!("score off the increment grid: {}", snapshot.score));
    }

    if snapshot.tick_ms < config.min_tick_ms || snapshot.tick_ms > config.initial_tick_ms {
        anomalies.push(format!("tick period out of range: {}ms", snapshot.tick_ms));
    }

    if snapshot.level < 1 {
        anomalies.push(format!("invalid level: {}", snapshot.level));
    }

    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

#[allow(clippy::too_many_arguments)]
fn build_batch_summary(
    batch_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
    best_score: i32,
) -> BatchSummary {
    let run_count = runs.len();
    let average_ticks = if run_count == 0 {
        0
    } else {
        total_ticks / run_count as u64
    };
    BatchSummary {
        batch_id,
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count,
        best_score,
        average_ticks,
        reason_counts,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    batch_id: &str,
    run: Option<u32>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        batch_id: batch_id.to_string(),
        run,
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn reason_key(reason: RunEndReason) -> String {
    match reason {
        RunEndReason::GameOver => "game_over",
        RunEndReason::TickLimit => "tick_limit",
    }
    .to_string()
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &BatchSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("batch summary should serialize");
    std::fs::write(path, summary_text)
}
