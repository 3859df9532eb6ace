//! Presentation sink
//!
//! The simulation never touches a screen. It records `GameEvent`s and a host
//! forwards them to a `DisplaySink` with [`present`].

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::sim::{AccuracyMatch, GameEvent, GamePhase, Millis, RoundOverReason};

/// Page-level UI state (drives which overlay buttons are shown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiState {
    Menu,
    Playing,
    /// Clock stopped, candy raining
    Star,
    GameOver,
    NextLevel,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Menu => "menu",
            UiState::Playing => "playing",
            UiState::Star => "star",
            UiState::GameOver => "gameover",
            UiState::NextLevel => "nextlevel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "menu" => Some(UiState::Menu),
            "playing" => Some(UiState::Playing),
            "star" => Some(UiState::Star),
            "gameover" => Some(UiState::GameOver),
            "nextlevel" => Some(UiState::NextLevel),
            _ => None,
        }
    }

    pub fn for_phase(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Idle => UiState::Menu,
            GamePhase::Running => UiState::Playing,
            GamePhase::Resolving | GamePhase::CountingDown => UiState::Star,
            GamePhase::RoundOver => UiState::GameOver,
            GamePhase::NextStage => UiState::NextLevel,
        }
    }
}

/// Where round feedback goes (DOM, terminal, test recorder)
pub trait DisplaySink {
    fn set_score(&mut self, score: u64);
    fn set_target_time(&mut self, target: Millis);
    fn set_elapsed(&mut self, elapsed: Millis);
    /// Elapsed time with the matched prefix highlighted
    fn set_elapsed_annotated(&mut self, accuracy: &AccuracyMatch);
    fn set_countdown(&mut self, remaining: Millis);
    fn set_result_text(&mut self, text: &str);
    fn set_ui_state(&mut self, state: UiState);
}

pub const MATCH_COLOR: &str = "#0f0";
pub const MISS_COLOR: &str = "rgba(255,255,255,0.3)";

/// One `<span>` per digit, matched digits in green and the rest dimmed
pub fn render_annotated_html(accuracy: &AccuracyMatch) -> String {
    let mut html = String::new();
    for digit in &accuracy.digits {
        let color = if digit.matched { MATCH_COLOR } else { MISS_COLOR };
        let _ = write!(html, "<span style=\"color:{}\">{}</span>", color, digit.ch);
    }
    html
}

pub fn score_text(score: u64) -> String {
    format!("Score: {}", score)
}

pub const GAME_OVER_TEXT: &str = "Game Over!";

/// Forward a batch of events to `sink`
pub fn present(events: &[GameEvent], sink: &mut dyn DisplaySink) {
    for event in events {
        match event {
            GameEvent::PhaseChanged { to, .. } => sink.set_ui_state(UiState::for_phase(*to)),
            GameEvent::RoundStarted { target, score, .. } => {
                sink.set_target_time(*target);
                sink.set_elapsed(Millis::ZERO);
                sink.set_score(*score);
                sink.set_result_text("");
            }
            GameEvent::ClockAdvanced(elapsed) => sink.set_elapsed(*elapsed),
            GameEvent::StageResolved(accuracy) => sink.set_elapsed_annotated(accuracy),
            GameEvent::ScoreChanged(score) => sink.set_score(*score),
            GameEvent::CountdownStarted(remaining) | GameEvent::CountdownTick(remaining) => {
                sink.set_countdown(*remaining)
            }
            GameEvent::RoundOver(RoundOverReason::ObstacleContact) => {
                sink.set_result_text(GAME_OVER_TEXT)
            }
            _ => {}
        }
    }
}

/// Sink that writes feedback to the log
#[derive(Debug, Default)]
pub struct LogSink {
    /// Countdown updates are frequent; only whole seconds are logged
    last_countdown_secs: Option<u32>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogSink {
    fn set_score(&mut self, score: u64) {
        log::info!("{}", score_text(score));
    }

    fn set_target_time(&mut self, target: Millis) {
        log::info!("Target: {}", target);
    }

    fn set_elapsed(&mut self, elapsed: Millis) {
        log::trace!("Elapsed: {}", elapsed);
    }

    fn set_elapsed_annotated(&mut self, accuracy: &AccuracyMatch) {
        log::info!(
            "Stopped: {} (matched \"{}\", stage {})",
            accuracy.digits.iter().map(|d| d.ch).collect::<String>(),
            accuracy.matched_prefix(),
            accuracy.stage
        );
    }

    fn set_countdown(&mut self, remaining: Millis) {
        let secs = remaining.0 / 1000;
        if self.last_countdown_secs != Some(secs) {
            self.last_countdown_secs = Some(secs);
            log::info!("Countdown: {}", remaining);
        }
    }

    fn set_result_text(&mut self, text: &str) {
        if !text.is_empty() {
            log::info!("{}", text);
        }
    }

    fn set_ui_state(&mut self, state: UiState) {
        log::debug!("UI state: {}", state.as_str());
    }
}

/// Sink that keeps the latest text of every field
#[derive(Debug, Clone, PartialEq)]
pub struct TextSink {
    pub score: String,
    pub target: String,
    pub elapsed: String,
    pub result: String,
    pub ui_state: UiState,
}

impl Default for TextSink {
    fn default() -> Self {
        Self {
            score: score_text(0),
            target: Millis::ZERO.to_string(),
            elapsed: Millis::ZERO.to_string(),
            result: String::new(),
            ui_state: UiState::Menu,
        }
    }
}

impl DisplaySink for TextSink {
    fn set_score(&mut self, score: u64) {
        self.score = score_text(score);
    }

    fn set_target_time(&mut self, target: Millis) {
        self.target = target.to_string();
    }

    fn set_elapsed(&mut self, elapsed: Millis) {
        self.elapsed = elapsed.to_string();
    }

    fn set_elapsed_annotated(&mut self, accuracy: &AccuracyMatch) {
        self.elapsed = render_annotated_html(accuracy);
    }

    fn set_countdown(&mut self, remaining: Millis) {
        self.result = remaining.to_string();
    }

    fn set_result_text(&mut self, text: &str) {
        self.result = text.to_string();
    }

    fn set_ui_state(&mut self, state: UiState) {
        self.ui_state = state;
    }
}
