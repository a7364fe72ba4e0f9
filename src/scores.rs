use std::fs;
use std::io;
use std::path::PathBuf;

const SCORE_FILE: &str = "cube-dodge.highscore";

/// The best score ever achieved, persisted as plain decimal text.
#[derive(Debug)]
pub struct HighScore {
    best: u32,
    path: PathBuf,
}

impl HighScore {
    /// Load the stored high score, creating the file with "0" when it
    /// does not exist yet. Any other failure is fatal: there is no
    /// fallback score-tracking path.
    pub fn load() -> io::Result<Self> {
        Self::load_from(Self::score_path())
    }

    fn score_path() -> PathBuf {
        // Store next to the executable
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join(SCORE_FILE);
            }
        }
        PathBuf::from(SCORE_FILE)
    }

    pub(crate) fn load_from(path: PathBuf) -> io::Result<Self> {
        if !path.exists() {
            fs::write(&path, "0")?;
            return Ok(Self { best: 0, path });
        }
        let contents = fs::read_to_string(&path)?;
        let best = contents.trim().parse::<u32>().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("corrupt high score file {}: {e}", path.display()),
            )
        })?;
        Ok(Self { best, path })
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Record a finished run. The file is rewritten, and true returned,
    /// only when the score beats the stored record.
    pub fn record(&mut self, score: u32) -> io::Result<bool> {
        if score <= self.best {
            return Ok(false);
        }
        self.best = score;
        fs::write(&self.path, self.best.to_string())?;
        Ok(true)
    }
}
