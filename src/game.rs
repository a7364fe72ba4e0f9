use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;

/// Logical play field size; the renderer scales this to the terminal.
pub const FIELD_WIDTH: f32 = 600.0;
pub const FIELD_HEIGHT: f32 = 800.0;

pub const PLAYER_SIZE: f32 = 50.0;
pub const BLOCK_SIZE: f32 = 50.0;
/// Vertical distance every falling entity covers per frame.
pub const FALL_SPEED: f32 = 6.0;
/// Horizontal distance the player covers per movement key event.
pub const MOVE_STEP: f32 = 7.0;
/// Top edge of the player square (100 above the field bottom).
const PLAYER_Y: f32 = FIELD_HEIGHT - 100.0;

const OBSTACLE_CHANCE: f64 = 0.03;
const POWERUP_CHANCE: f64 = 0.005;

/// How long a collected power-up shields the player, in milliseconds.
pub const INVINCIBILITY_MS: u64 = 5_000;
pub const STARTING_LIVES: u32 = 3;

/// Axis-aligned rectangle in logical field units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Non-empty overlap of both the x and y ranges.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Paused,
    GameOver,
}

/// Side effects of one frame, for the caller to map to audio and
/// persistence. The simulation itself never touches either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// An obstacle hit the unshielded player.
    Hit,
    /// A power-up was collected.
    Collect,
    /// Lives reached zero; carries the final score of the run.
    GameOver { score: u32 },
}

pub struct CubeDodge {
    pub player: Rect,
    pub obstacles: Vec<Rect>,
    pub powerups: Vec<Rect>,
    pub score: u32,
    pub lives: u32,
    pub phase: Phase,
    /// Timestamp (ms) at which invincibility runs out, if shielded.
    pub invincible_until: Option<u64>,
}

impl CubeDodge {
    pub fn new() -> Self {
        Self {
            player: Rect::new(
                (FIELD_WIDTH - PLAYER_SIZE) / 2.0,
                PLAYER_Y,
                PLAYER_SIZE,
                PLAYER_SIZE,
            ),
            obstacles: Vec::new(),
            powerups: Vec::new(),
            score: 0,
            lives: STARTING_LIVES,
            phase: Phase::Playing,
            invincible_until: None,
        }
    }

    /// Shield state as of the last `update`.
    pub fn is_invincible(&self) -> bool {
        self.invincible_until.is_some()
    }

    /// Advance the simulation by one frame. `now_ms` is the caller's
    /// clock; nothing in here reads real time.
    pub fn update(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Playing {
            return events;
        }

        // Expire before collisions: a frame at the boundary is unshielded.
        if self.invincible_until.is_some_and(|until| now_ms >= until) {
            self.invincible_until = None;
        }

        self.score += 1;
        self.spawn_entities();
        self.step_entities(now_ms, &mut events);

        events
    }

    fn spawn_entities(&mut self) {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(OBSTACLE_CHANCE) {
            let x = rng.gen_range(0.0..=FIELD_WIDTH - BLOCK_SIZE);
            self.obstacles
                .push(Rect::new(x, -BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE));
        }
        if rng.gen_bool(POWERUP_CHANCE) {
            let x = rng.gen_range(0.0..=FIELD_WIDTH - BLOCK_SIZE);
            self.powerups
                .push(Rect::new(x, -BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE));
        }
    }

    fn step_entities(&mut self, now_ms: u64, events: &mut Vec<GameEvent>) {
        for block in self.obstacles.iter_mut().chain(self.powerups.iter_mut()) {
            block.y += FALL_SPEED;
        }

        let player = self.player;
        let shielded = self.is_invincible();

        // An obstacle is consumed by the collision whether or not it
        // deals damage; anything past the bottom edge despawns.
        let mut hits = 0u32;
        self.obstacles.retain(|block| {
            if block.intersects(&player) {
                hits += 1;
                return false;
            }
            block.y <= FIELD_HEIGHT
        });

        if !shielded {
            for _ in 0..hits {
                if self.phase == Phase::GameOver {
                    break;
                }
                events.push(GameEvent::Hit);
                self.lives = self.lives.saturating_sub(1);
                if self.lives == 0 {
                    self.phase = Phase::GameOver;
                    events.push(GameEvent::GameOver { score: self.score });
                }
            }
        }

        let mut collected = 0u32;
        self.powerups.retain(|block| {
            if block.intersects(&player) {
                collected += 1;
                return false;
            }
            block.y <= FIELD_HEIGHT
        });

        for _ in 0..collected {
            events.push(GameEvent::Collect);
        }
        if collected > 0 {
            self.invincible_until = Some(now_ms + INVINCIBILITY_MS);
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => {
                if self.phase == Phase::Playing {
                    self.player.x = (self.player.x - MOVE_STEP).max(0.0);
                }
            }
            KeyCode::Right => {
                if self.phase == Phase::Playing {
                    self.player.x = (self.player.x + MOVE_STEP).min(FIELD_WIDTH - PLAYER_SIZE);
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.phase = match self.phase {
                    Phase::Playing => Phase::Paused,
                    Phase::Paused => Phase::Playing,
                    Phase::GameOver => Phase::GameOver,
                };
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.phase == Phase::GameOver {
                    self.reset();
                }
            }
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        *self = CubeDodge::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use proptest::prelude::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// A block sitting right on the player; still overlapping after one
    /// fall step, so the next update registers the collision.
    fn block_on_player(game: &CubeDodge) -> Rect {
        game.player
    }

    #[test]
    fn score_counts_frames_while_playing() {
        let mut game = CubeDodge::new();
        game.update(0);
        game.update(16);
        assert_eq!(game.score, 2);
    }

    #[test]
    fn paused_frames_are_inert() {
        let mut game = CubeDodge::new();
        game.obstacles.push(Rect::new(10.0, 100.0, BLOCK_SIZE, BLOCK_SIZE));
        game.handle_input(key(KeyCode::Char('p')));
        assert_eq!(game.phase, Phase::Paused);

        let events = game.update(16);
        assert!(events.is_empty());
        assert_eq!(game.score, 0);
        assert_eq!(game.obstacles[0].y, 100.0);

        game.handle_input(key(KeyCode::Char('p')));
        assert_eq!(game.phase, Phase::Playing);
    }

    #[test]
    fn obstacles_fall_by_fixed_speed() {
        let mut game = CubeDodge::new();
        game.obstacles.push(Rect::new(10.0, 100.0, BLOCK_SIZE, BLOCK_SIZE));
        game.update(0);
        assert!(game.obstacles.iter().any(|b| b.y == 106.0));
    }

    #[test]
    fn entities_despawn_past_the_bottom_edge() {
        let mut game = CubeDodge::new();
        // Lands exactly on the edge: kept. One step further: removed.
        game.obstacles.push(Rect::new(10.0, 794.0, BLOCK_SIZE, BLOCK_SIZE));
        game.obstacles.push(Rect::new(90.0, 795.0, BLOCK_SIZE, BLOCK_SIZE));
        game.update(0);
        assert!(game.obstacles.iter().any(|b| b.y == 800.0));
        assert!(!game.obstacles.iter().any(|b| b.y > 800.0));
    }

    #[test]
    fn collision_costs_a_life_and_consumes_the_obstacle() {
        let mut game = CubeDodge::new();
        game.obstacles.push(block_on_player(&game));

        let events = game.update(0);
        assert_eq!(events, vec![GameEvent::Hit]);
        assert_eq!(game.lives, 2);
        assert_eq!(game.phase, Phase::Playing);
        assert!(game.obstacles.iter().all(|b| !b.intersects(&game.player)));
    }

    #[test]
    fn shielded_player_takes_no_damage_but_obstacle_is_consumed() {
        let mut game = CubeDodge::new();
        game.invincible_until = Some(u64::MAX);
        game.obstacles.push(block_on_player(&game));

        let events = game.update(0);
        assert!(events.is_empty());
        assert_eq!(game.lives, STARTING_LIVES);
        assert!(game.obstacles.iter().all(|b| !b.intersects(&game.player)));
    }

    #[test]
    fn powerup_grants_shield_until_expiry() {
        let mut game = CubeDodge::new();
        game.powerups.push(block_on_player(&game));

        let events = game.update(1_000);
        assert_eq!(events, vec![GameEvent::Collect]);
        assert!(game.powerups.iter().all(|p| !p.intersects(&game.player)));
        assert!(game.is_invincible());

        // Lower-inclusive, upper-exclusive: alive at expiry - 1 ms,
        // gone at expiry.
        game.update(1_000 + INVINCIBILITY_MS - 1);
        assert!(game.is_invincible());
        game.update(1_000 + INVINCIBILITY_MS);
        assert!(!game.is_invincible());
    }

    #[test]
    fn expired_shield_no_longer_blocks_damage() {
        let mut game = CubeDodge::new();
        game.powerups.push(block_on_player(&game));
        game.update(0);
        assert!(game.is_invincible());

        game.obstacles.push(block_on_player(&game));
        let events = game.update(INVINCIBILITY_MS);
        assert_eq!(events, vec![GameEvent::Hit]);
        assert_eq!(game.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn zero_lives_ends_the_run_exactly_once() {
        let mut game = CubeDodge::new();
        game.lives = 1;
        // Two overlapping obstacles in the same frame: one hit, one
        // game-over transition, nothing past that.
        game.obstacles.push(block_on_player(&game));
        game.obstacles.push(block_on_player(&game));

        let events = game.update(0);
        assert_eq!(
            events,
            vec![GameEvent::Hit, GameEvent::GameOver { score: 1 }]
        );
        assert_eq!(game.lives, 0);
        assert_eq!(game.phase, Phase::GameOver);

        // Game-over frames are inert.
        assert!(game.update(16).is_empty());
        assert_eq!(game.score, 1);
    }

    #[test]
    fn restart_is_ignored_while_playing() {
        let mut game = CubeDodge::new();
        game.update(0);
        game.update(16);
        game.handle_input(key(KeyCode::Char('r')));
        assert_eq!(game.score, 2);
        assert_eq!(game.phase, Phase::Playing);
    }

    #[test]
    fn restart_from_game_over_resets_the_run() {
        let mut game = CubeDodge::new();
        game.lives = 1;
        game.obstacles.push(block_on_player(&game));
        game.update(0);
        assert_eq!(game.phase, Phase::GameOver);

        game.handle_input(key(KeyCode::Char('r')));
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.score, 0);
        assert_eq!(game.lives, STARTING_LIVES);
        assert!(game.obstacles.is_empty());
        assert!(game.powerups.is_empty());
        assert!(!game.is_invincible());
        assert_eq!(game.player.x, (FIELD_WIDTH - PLAYER_SIZE) / 2.0);
    }

    #[test]
    fn movement_is_clamped_to_the_field() {
        let mut game = CubeDodge::new();
        for _ in 0..200 {
            game.handle_input(key(KeyCode::Left));
        }
        assert_eq!(game.player.x, 0.0);

        for _ in 0..200 {
            game.handle_input(key(KeyCode::Right));
        }
        assert_eq!(game.player.x, FIELD_WIDTH - PLAYER_SIZE);
    }

    #[test]
    fn movement_is_ignored_unless_playing() {
        let mut game = CubeDodge::new();
        let start_x = game.player.x;
        game.handle_input(key(KeyCode::Char('p')));
        game.handle_input(key(KeyCode::Left));
        assert_eq!(game.player.x, start_x);
    }

    #[test]
    fn spawner_eventually_produces_obstacles() {
        let mut game = CubeDodge::new();
        let mut spawned = false;
        for frame in 0..10_000u64 {
            game.update(frame * 16);
            if !game.obstacles.is_empty() {
                spawned = true;
                break;
            }
        }
        assert!(spawned);
    }

    #[test]
    fn spawner_eventually_produces_powerups() {
        let mut game = CubeDodge::new();
        // Permanent shield so stray obstacle hits cannot end the run.
        game.invincible_until = Some(u64::MAX);
        let mut spawned = false;
        for frame in 0..50_000u64 {
            game.update(frame * 16);
            if !game.powerups.is_empty() {
                spawned = true;
                break;
            }
        }
        assert!(spawned);
    }

    proptest! {
        #[test]
        fn player_never_leaves_the_field(moves in proptest::collection::vec(any::<bool>(), 0..400)) {
            let mut game = CubeDodge::new();
            for to_left in moves {
                let code = if to_left { KeyCode::Left } else { KeyCode::Right };
                game.handle_input(key(code));
                prop_assert!(game.player.x >= 0.0);
                prop_assert!(game.player.x + PLAYER_SIZE <= FIELD_WIDTH);
            }
        }

        #[test]
        fn intersection_is_symmetric(
            ax in 0f32..FIELD_WIDTH, ay in 0f32..FIELD_HEIGHT,
            bx in 0f32..FIELD_WIDTH, by in 0f32..FIELD_HEIGHT,
        ) {
            let a = Rect::new(ax, ay, BLOCK_SIZE, BLOCK_SIZE);
            let b = Rect::new(bx, by, BLOCK_SIZE, BLOCK_SIZE);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}
