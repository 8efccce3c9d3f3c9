use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use asl_lesson_engine::config::Config;
use asl_lesson_engine::logging::init_tracing;
use asl_lesson_engine::{
    Course, Evaluation, JudgeScore, KeyValueStore, SessionStart, SlotKind, SlotOutcome, SlotVerdict,
    SqliteStore, StepReport, SystemClock, Trainer, TrainerError,
};

const USAGE: &str = "usage: asl-trainer <status | lesson <id> | skip <unit>>";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Some(command) => command,
        None => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let course = match Course::load(&config.course_path) {
        Ok(course) => course,
        Err(e) => {
            tracing::error!(path = %config.course_path.display(), error = %e, "failed to load course");
            return ExitCode::FAILURE;
        }
    };

    let store = match SqliteStore::open(&config.db_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(path = %config.db_path.display(), error = %e, "failed to open learner database");
            return ExitCode::FAILURE;
        }
    };

    let mut trainer = Trainer::new(course, store, config.engine.clone(), Arc::new(SystemClock));

    let result = match command {
        Command::Status => {
            print_status(&trainer);
            Ok(())
        }
        Command::Lesson(id) => trainer.start_lesson(id).and_then(|start| run_session(&mut trainer, start)),
        Command::Skip(unit) => trainer
            .start_skip_attempt(unit)
            .and_then(|start| run_session(&mut trainer, start)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

enum Command {
    Status,
    Lesson(u32),
    Skip(u32),
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [cmd] if cmd == "status" => Some(Command::Status),
            [cmd, id] if cmd == "lesson" => id.parse().ok().map(Command::Lesson),
            [cmd, unit] if cmd == "skip" => unit.parse().ok().map(Command::Skip),
            _ => None,
        }
    }
}

fn print_status<S: KeyValueStore>(trainer: &Trainer<S>) {
    let progress = trainer.progress();
    let level = progress.level();
    println!(
        "Level {} ({}%, {} XP to next) | total {} XP | today {} XP",
        level.level, level.level_progress, level.xp_for_next_level, progress.total_xp, progress.daily_xp
    );

    for (id, status) in trainer.lesson_statuses() {
        if let Ok(lesson) = trainer.course().lesson(id) {
            println!(
                "  [{:>3}] unit {} {:<14} {:?} ({} XP)",
                id, lesson.unit, lesson.title, status, lesson.xp
            );
        }
    }
}

fn run_session<S: KeyValueStore>(trainer: &mut Trainer<S>, start: SessionStart) -> Result<(), TrainerError> {
    let slots = match start {
        SessionStart::Completed(report) => {
            print_report(&report);
            return Ok(());
        }
        SessionStart::Active { mode, slots } => {
            println!("{mode:?}: {slots} slots. Type 'q' to leave.");
            slots
        }
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(slot) = trainer.current_slot().cloned() {
        println!();
        println!("Slot {}/{}", slot.ordinal + 1, slots);

        let outcome = match slot.kind {
            SlotKind::Recognize => {
                println!("Watch {} and pick its meaning:", slot.word.media_ref);
                let options = slot.choices.as_ref().map(|c| c.options.clone()).unwrap_or_default();
                for (i, option) in options.iter().enumerate() {
                    println!("  {}) {}", i + 1, option);
                }
                let Some(line) = prompt(&mut lines, "answer> ") else {
                    return trainer.back_out();
                };
                let picked = line
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| options.get(n.wrapping_sub(1)))
                    .cloned()
                    .unwrap_or(line);
                let correct = slot.choices.as_ref().is_some_and(|c| c.is_correct(&picked));
                SlotOutcome::Recognized {
                    first_answer_correct: correct,
                }
            }
            SlotKind::Recall | SlotKind::Produce => {
                if slot.kind == SlotKind::Recall {
                    println!("Watch {}, then sign \"{}\".", slot.word.media_ref, slot.word.text);
                } else {
                    println!("Sign \"{}\" from memory.", slot.word.text);
                }
                let Some(line) = prompt(&mut lines, "score 0-4, evaluator JSON, or blank> ") else {
                    return trainer.back_out();
                };
                SlotOutcome::Judged {
                    verdict: judge_input(&line, &slot.word.text, trainer.config().judge_pass_score),
                }
            }
        };

        match trainer.submit(outcome) {
            Ok(report) => print_report(&report),
            Err(TrainerError::Session(e)) => println!("{e}"),
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// `None` on end of input or `q`
fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let line = lines.next()?.ok()?;
    let line = line.trim().to_string();
    (line != "q").then_some(line)
}

fn judge_input(line: &str, word: &str, pass_score: u8) -> SlotVerdict {
    if line.is_empty() {
        return SlotVerdict::NotYetJudged;
    }
    if let Ok(score) = line.parse::<i64>() {
        return JudgeScore::new(score).verdict(pass_score);
    }
    let evaluation = Evaluation::parse_response(line, word);
    println!("  judge: {} ({}/4)", evaluation.summary, evaluation.score.value());
    evaluation.verdict(pass_score)
}

fn print_report(report: &StepReport) {
    if let Some(slot) = &report.slot {
        let mark = if report.slot_passed { "pass" } else { "miss" };
        println!("  {mark}: {}", slot.word.text);
    }
    if let Some(checkpoint) = report.deck_revised {
        println!("  upcoming slots adjusted ({checkpoint:?})");
    }
    for error in &report.storage_errors {
        println!("  warning: progress not saved ({error})");
    }
    if let Some(verdict) = &report.verdict {
        if verdict.passed {
            println!("Passed! +{} XP", verdict.xp_awarded);
        } else {
            let reason = verdict.failure_reason.map(|r| r.as_str()).unwrap_or("unknown");
            println!("Not passed ({reason}). Try again.");
        }
    }
}
