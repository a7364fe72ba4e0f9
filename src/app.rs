use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::audio::Audio;
use crate::game::{CubeDodge, GameEvent};
use crate::scores::HighScore;

pub struct App {
    pub should_quit: bool,
    pub game: CubeDodge,
    pub scores: HighScore,
    /// Session time of the last tick, in ms; the renderer reads this
    /// instead of the wall clock.
    pub now_ms: u64,
    audio: Option<Audio>,
    clock: Instant,
}

impl App {
    pub fn new(scores: HighScore) -> Self {
        let audio = match Audio::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::warn!("audio unavailable, continuing silently: {e}");
                None
            }
        };
        Self {
            should_quit: false,
            game: CubeDodge::new(),
            scores,
            now_ms: 0,
            audio,
            clock: Instant::now(),
        }
    }

    pub fn on_tick(&mut self) {
        self.now_ms = self.clock.elapsed().as_millis() as u64;
        for event in self.game.update(self.now_ms) {
            match event {
                GameEvent::Hit => {
                    if let Some(audio) = &self.audio {
                        audio.play_hit();
                    }
                }
                GameEvent::Collect => {
                    if let Some(audio) = &self.audio {
                        audio.play_collect();
                    }
                }
                GameEvent::GameOver { score } => {
                    // A failed write is non-fatal mid-run; the in-memory
                    // record stays current for this session.
                    if let Err(e) = self.scores.record(score) {
                        log::warn!("failed to persist high score: {e}");
                    }
                }
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            _ => self.game.handle_input(key),
        }
    }
}
