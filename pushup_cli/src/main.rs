use chrono::{Local, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use pushup_core::config::DataConfig;
use pushup_core::*;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

type Engine = WorkoutEngine<SystemClock, JsonFileStore>;

#[derive(Parser)]
#[command(name = "pushup")]
#[command(about = "Push-up counter with timers, streaks and achievements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count reps interactively (default)
    Session,

    /// Show today's progress and lifetime stats
    Status,

    /// List completed sessions, newest first
    History {
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the achievement catalog and progress
    Achievements,

    /// Delete one session from history
    Delete {
        /// Session id as shown by `history`
        id: uuid::Uuid,
    },

    /// Export session history as CSV
    Export {
        /// Output file
        path: PathBuf,
    },

    /// Choose the session timer
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Configure the countdown length
    Countdown {
        #[arg(long, default_value_t = 0)]
        minutes: u32,

        #[arg(long, default_value_t = 0)]
        seconds: u32,
    },

    /// Change settings
    Settings {
        /// Daily rep goal
        #[arg(long)]
        goal: Option<u32>,

        #[arg(long, value_enum)]
        sound: Option<Toggle>,

        /// Announce every fifth rep
        #[arg(long, value_enum)]
        voice: Option<Toggle>,

        /// Start the rest timer after each rep and each countdown
        #[arg(long, value_enum)]
        auto_rest: Option<Toggle>,

        /// Rest timer length in seconds
        #[arg(long)]
        rest_duration: Option<u32>,

        /// Daily reminder time (HH:MM) or "off"
        #[arg(long)]
        reminder: Option<String>,

        /// Milestone notifications
        #[arg(long, value_enum)]
        milestones: Option<Toggle>,

        /// Daily goal notifications
        #[arg(long, value_enum)]
        goal_alerts: Option<Toggle>,

        /// Streak notifications
        #[arg(long, value_enum)]
        streak_reminders: Option<Toggle>,
    },

    /// Erase all statistics and history
    ResetAll {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Stopwatch,
    Counter,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    pushup_core::logging::init_with_level(&config.logging.level);

    let data = DataConfig {
        data_dir: cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()),
    };
    let state_path = data.state_path();
    tracing::debug!("Using state file {}", state_path.display());
    let store = JsonFileStore::new(state_path).with_seed(config.seed_state());
    let (mut engine, startup_events) = WorkoutEngine::open(SystemClock::new(), store)?;
    render_events(&startup_events);

    match cli.command {
        Some(Commands::Session) | None => cmd_session(&mut engine),
        Some(Commands::Status) => {
            display_status(&engine);
            Ok(())
        }
        Some(Commands::History { limit }) => {
            display_history(&engine, limit);
            Ok(())
        }
        Some(Commands::Achievements) => {
            display_achievements(&engine);
            Ok(())
        }
        Some(Commands::Delete { id }) => {
            if engine.delete_session(id)? {
                println!("✓ Deleted session {}", id);
            } else {
                println!("No session with id {}", id);
            }
            Ok(())
        }
        Some(Commands::Export { path }) => {
            let count = export_history_csv(engine.history(), &path)?;
            println!("✓ Exported {} sessions", count);
            println!("  CSV: {}", path.display());
            Ok(())
        }
        Some(Commands::Mode { mode }) => {
            let mode = match mode {
                ModeArg::Stopwatch => TimerMode::Stopwatch,
                ModeArg::Counter => TimerMode::Counter,
            };
            engine.set_timer_mode(mode)?;
            println!("✓ Timer mode: {}", mode_label(mode));
            Ok(())
        }
        Some(Commands::Countdown { minutes, seconds }) => {
            engine.set_countdown(minutes, seconds)?;
            println!("✓ Countdown set to {}", engine.countdown().display());
            Ok(())
        }
        Some(Commands::Settings {
            goal,
            sound,
            voice,
            auto_rest,
            rest_duration,
            reminder,
            milestones,
            goal_alerts,
            streak_reminders,
        }) => {
            let reminder = reminder.map(|r| parse_reminder(&r)).transpose()?;
            let events = engine.update_settings(|s| {
                if let Some(goal) = goal {
                    s.daily_goal = goal;
                }
                if let Some(sound) = sound {
                    s.sound_enabled = sound.enabled();
                }
                if let Some(voice) = voice {
                    s.voice_count_enabled = voice.enabled();
                }
                if let Some(auto_rest) = auto_rest {
                    s.auto_rest_timer = auto_rest.enabled();
                }
                if let Some(secs) = rest_duration {
                    s.rest_duration_secs = secs;
                }
                if let Some(milestones) = milestones {
                    s.milestone_notifications = milestones.enabled();
                }
                if let Some(goal_alerts) = goal_alerts {
                    s.goal_notifications = goal_alerts.enabled();
                }
                if let Some(streak_reminders) = streak_reminders {
                    s.streak_reminders = streak_reminders.enabled();
                }
                if let Some(reminder) = reminder {
                    s.daily_reminders_enabled = reminder.is_some();
                    if let Some(at) = reminder {
                        s.reminder_time = at;
                    }
                }
            })?;
            render_events(&events);
            display_settings(engine.settings());
            Ok(())
        }
        Some(Commands::ResetAll { yes }) => {
            if !yes {
                return Err(Error::Other(
                    "reset-all erases all history; pass --yes to confirm".into(),
                ));
            }
            engine.reset_all()?;
            println!("✓ All statistics and history erased");
            Ok(())
        }
    }
}

/// `Some(time)` to enable the reminder, `None` for "off"
fn parse_reminder(input: &str) -> Result<Option<NaiveTime>> {
    if input.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    NaiveTime::parse_from_str(input, "%H:%M")
        .map(Some)
        .map_err(|e| Error::Config(format!("Invalid reminder time '{}': {}", input, e)))
}

// ============================================================================
// Interactive session
// ============================================================================

enum Input {
    Increment,
    QuickAdd(u32),
    Decrement,
    ToggleTimer,
    ResetCountdown,
    Rest,
    Finish,
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | "+" => Input::Increment,
        "-" => Input::Decrement,
        "t" => Input::ToggleTimer,
        "c" => Input::ResetCountdown,
        "r" => Input::Rest,
        "f" => Input::Finish,
        "s" => Input::Status,
        "h" | "?" => Input::Help,
        "q" => Input::Quit,
        other => match other.strip_prefix('+').map(str::parse::<u32>) {
            Some(Ok(n)) => Input::QuickAdd(n),
            _ => Input::Unknown(other.to_string()),
        },
    }
}

fn cmd_session(engine: &mut Engine) -> Result<()> {
    const POLL_INTERVAL: Duration = Duration::from_millis(200);

    // Stdin blocks, so it gets its own thread; the engine stays on this one.
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    print_help();
    display_status(engine);

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                let events = match parse_input(&line) {
                    Input::Quit => break,
                    Input::Increment => engine.increment()?,
                    Input::QuickAdd(n) => engine.quick_add(n)?,
                    Input::Decrement => {
                        let events = engine.decrement()?;
                        println!("  {}", engine.current_count());
                        events
                    }
                    Input::ToggleTimer => {
                        let running = engine.toggle_active_timer();
                        println!(
                            "  {} {}",
                            mode_label(engine.timer_mode()),
                            if running { "running" } else { "paused" }
                        );
                        Vec::new()
                    }
                    Input::ResetCountdown => {
                        engine.reset_countdown();
                        println!("  Countdown reset to {}", engine.countdown().display());
                        Vec::new()
                    }
                    Input::Rest => engine.start_rest_timer(),
                    Input::Finish => {
                        let events = engine.reset_session()?;
                        if events.is_empty() {
                            println!("  Nothing to save yet");
                        }
                        events
                    }
                    Input::Status => {
                        display_status(engine);
                        Vec::new()
                    }
                    Input::Help => {
                        print_help();
                        Vec::new()
                    }
                    Input::Unknown(input) => {
                        println!("  Unknown input '{}' (h for help)", input);
                        Vec::new()
                    }
                };
                render_events(&events);
                if engine.has_new_achievement() {
                    engine.clear_new_achievement();
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("stdin closed, ending session");
                break;
            }
        }

        render_events(&engine.pump());
    }

    if engine.current_count() > 0 {
        println!(
            "Unfinished set of {} reps not saved as a session (f to finish)",
            engine.current_count()
        );
    }
    Ok(())
}

fn print_help() {
    println!("─────────────────────────────────────────");
    println!("Enter or '+'  count a rep      '+N'  add N reps");
    println!("'-'  undo last rep             'f'   finish session");
    println!("'t'  start/pause timer         'c'   reset countdown");
    println!("'r'  start rest timer          's'   status");
    println!("'q'  quit");
    println!("─────────────────────────────────────────");
}

// ============================================================================
// Rendering
// ============================================================================

fn mode_label(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Stopwatch => "stopwatch",
        TimerMode::Counter => "countdown",
    }
}

fn render_events(events: &[Event]) {
    let ring = io::stdout().is_terminal();
    for event in events {
        match event {
            Event::RepCounted { count } => println!("  {}", count),
            Event::PersonalBest { count } => println!("  ★ New personal best: {}", count),
            Event::Milestone { count } => println!("  🎉 Milestone: {} push-ups!", count),
            Event::GoalAchieved { goal } => println!("  ✓ Daily goal of {} reached!", goal),
            Event::SessionCompleted { session } => println!(
                "\n✓ Session saved: {} push-ups in {}",
                session.count,
                session.formatted_duration()
            ),
            Event::CountdownFinished => println!("\n⏰ Countdown finished!"),
            Event::RestStarted { duration_secs } => println!("  Rest {}s", duration_secs),
            Event::RestFinished => println!("\n⏱ Rest over, next set!"),
            Event::AchievementUnlocked { title: Some(title) } => {
                println!("\n🏆 Achievement unlocked: {}", title)
            }
            Event::AchievementUnlocked { title: None } => {
                println!("\n🏆 New achievement unlocked!")
            }
            Event::StreakContinues { streak } => {
                println!("🔥 {}-day streak, keep it going!", streak)
            }
            Event::ReminderScheduleChanged { at: Some(at) } => {
                println!("✓ Daily reminder at {}", at.format("%H:%M"))
            }
            Event::ReminderScheduleChanged { at: None } => println!("✓ Daily reminder off"),
            Event::Sound {
                cue: SoundCue::Complete | SoundCue::Beep | SoundCue::Achievement,
            } if ring => {
                print!("\x07");
            }
            Event::Speak { .. } | Event::Haptic { .. } | Event::Sound { .. } => {}
        }
    }
    let _ = io::stdout().flush();
}

fn display_status(engine: &Engine) {
    let stats = engine.stats();
    let settings = engine.settings();

    println!();
    println!(
        "  Today:         {} / {} ({:.0}%)",
        stats.today_total,
        settings.daily_goal,
        engine.goal_progress() * 100.0
    );
    println!("  Streak:        {} days", stats.current_streak);
    println!("  Personal best: {}", stats.personal_best);
    println!("  Total:         {}", stats.total_reps);
    println!(
        "  Sessions:      {} (avg {})",
        stats.sessions_completed,
        engine.average_per_session()
    );
    println!(
        "  This set:      {} reps, {}/min",
        engine.current_count(),
        engine.reps_per_minute()
    );

    match engine.timer_mode() {
        TimerMode::Stopwatch => println!(
            "  Stopwatch:     {}",
            timer::format_clock(engine.stopwatch().elapsed_secs())
        ),
        TimerMode::Counter => println!("  Countdown:     {}", engine.countdown().display()),
    }
    if engine.rest_timer().is_running() {
        println!("  Rest:          {}", engine.rest_timer().display());
    }
    println!();
}

fn display_history(engine: &Engine, limit: Option<usize>) {
    let history = engine.history();
    if history.is_empty() {
        println!("No sessions yet.");
        return;
    }

    for session in history.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{}  {:>4} push-ups in {:>6}  {}",
            session
                .completed_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M"),
            session.count,
            session.formatted_duration(),
            session.id
        );
    }
}

fn display_achievements(engine: &Engine) {
    let achievements = engine.achievements();
    let unlocked = achievements.iter().filter(|a| a.is_unlocked()).count();
    println!("Achievements: {} / {}", unlocked, achievements.len());

    for achievement in &achievements {
        let mark = if achievement.is_unlocked() { "x" } else { " " };
        println!(
            "  [{}] {:<16} {} ({}/{})",
            mark,
            achievement.def.title,
            achievement.def.description,
            achievement.current_progress.min(achievement.def.target),
            achievement.def.target
        );
    }
}

fn display_settings(settings: &Settings) {
    let on_off = |b: bool| if b { "on" } else { "off" };
    println!("  Daily goal:     {}", settings.daily_goal);
    println!("  Sound:          {}", on_off(settings.sound_enabled));
    println!("  Voice count:    {}", on_off(settings.voice_count_enabled));
    println!("  Auto rest:      {}", on_off(settings.auto_rest_timer));
    println!("  Rest duration:  {}s", settings.rest_duration_secs);
    println!("  Milestones:     {}", on_off(settings.milestone_notifications));
    println!("  Goal alerts:    {}", on_off(settings.goal_notifications));
    println!("  Streak alerts:  {}", on_off(settings.streak_reminders));
    if settings.daily_reminders_enabled {
        println!("  Reminder:       {}", settings.reminder_time.format("%H:%M"));
    } else {
        println!("  Reminder:       off");
    }
}
