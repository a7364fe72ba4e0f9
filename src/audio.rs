//! Best-effort sound: a looping background track plus one-shot cues.
//!
//! Every sound is synthesized up front, so the only failure mode is
//! the output device itself. Callers hold an `Option<Audio>`; without
//! a device the whole subsystem is a no-op and the game is unaffected.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

const SAMPLE_RATE: u32 = 44_100;

pub struct Audio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    _music: Option<Sink>,
}

impl Audio {
    /// Open the default output device and start the background loop.
    pub fn new() -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;
        let music = match Sink::try_new(&handle) {
            Ok(sink) => {
                sink.set_volume(0.25);
                sink.append(
                    SamplesBuffer::new(1, SAMPLE_RATE, music_samples()).repeat_infinite(),
                );
                Some(sink)
            }
            Err(e) => {
                log::warn!("background music disabled: {e}");
                None
            }
        };
        Ok(Self {
            _stream: stream,
            handle,
            _music: music,
        })
    }

    pub fn play_hit(&self) {
        self.play(hit_samples());
    }

    pub fn play_collect(&self) {
        self.play(collect_samples());
    }

    fn play(&self, samples: Vec<f32>) {
        if let Ok(sink) = Sink::try_new(&self.handle) {
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
            sink.detach();
        }
    }
}

/// Sine tone with a linear fade-out.
fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE as f32 * duration) as usize;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = volume * (1.0 - t / duration);
            (t * freq * std::f32::consts::TAU).sin() * envelope
        })
        .collect()
}

/// Downward pitch sweep for taking damage.
fn hit_samples() -> Vec<f32> {
    let duration = 0.25;
    let count = (SAMPLE_RATE as f32 * duration) as usize;
    let mut phase = 0.0f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 220.0 + (55.0 - 220.0) * (t / duration);
            phase += std::f32::consts::TAU * freq / SAMPLE_RATE as f32;
            phase.sin() * 0.4 * (1.0 - t / duration)
        })
        .collect()
}

/// Rising two-note chirp for collecting a power-up.
fn collect_samples() -> Vec<f32> {
    let mut samples = tone(660.0, 0.1, 0.35);
    samples.extend(tone(880.0, 0.15, 0.35));
    samples
}

/// Short arpeggio that repeats as background music.
fn music_samples() -> Vec<f32> {
    let notes = [220.0, 277.18, 329.63, 277.18, 220.0, 329.63, 440.0, 329.63];
    let mut samples = Vec::new();
    for freq in notes {
        samples.extend(tone(freq, 0.25, 0.2));
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_unit_amplitude() {
        for s in hit_samples()
            .into_iter()
            .chain(collect_samples())
            .chain(music_samples())
        {
            assert!(s.abs() <= 1.0);
        }
    }

    #[test]
    fn cues_are_short_one_shots() {
        // Half a second is plenty for a cue; the music loop is longer.
        assert!(hit_samples().len() <= SAMPLE_RATE as usize / 2);
        assert!(collect_samples().len() <= SAMPLE_RATE as usize / 2);
        assert!(music_samples().len() > SAMPLE_RATE as usize);
    }
}
