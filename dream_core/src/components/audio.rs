use log::debug;

use crate::error::{DreamError, Result};

/// Index into the backend's clip table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u32);

/// Seam between the engine and whatever produces sound. The runtime only
/// needs playback control and a readable playhead for marker events.
pub trait AudioBackend: Send {
    fn load_clip(&mut self, path: &str) -> Result<ClipHandle>;
    fn play(&mut self, clip: ClipHandle, volume: f32, looping: bool);
    fn pause(&mut self, clip: ClipHandle);
    fn stop(&mut self, clip: ClipHandle);
    /// Current playhead of the clip, in samples from the clip start.
    fn sample_offset(&self, clip: ClipHandle) -> u64;
}

#[derive(Default)]
struct ClipState {
    path: String,
    playing: bool,
    offset: u64,
}

/// Backend for headless runs and tests: clips "play" but the playhead
/// only moves when the driver sets it.
#[derive(Default)]
pub struct NullAudioBackend {
    clips: Vec<ClipState>,
}

impl NullAudioBackend {
    pub fn set_sample_offset(&mut self, clip: ClipHandle, offset: u64) {
        if let Some(state) = self.clips.get_mut(clip.0 as usize) {
            state.offset = offset;
        }
    }

    pub fn is_playing(&self, clip: ClipHandle) -> bool {
        self.clips
            .get(clip.0 as usize)
            .map(|c| c.playing)
            .unwrap_or(false)
    }

    pub fn clip_path(&self, clip: ClipHandle) -> Option<&str> {
        self.clips.get(clip.0 as usize).map(|c| c.path.as_str())
    }
}

impl AudioBackend for NullAudioBackend {
    fn load_clip(&mut self, path: &str) -> Result<ClipHandle> {
        if path.is_empty() {
            return Err(DreamError::AssetLoad {
                uuid: uuid::Uuid::nil(),
                reason: "audio clip path is empty".to_string(),
            });
        }
        debug!("null audio backend loading clip '{path}'");
        self.clips.push(ClipState {
            path: path.to_string(),
            ..ClipState::default()
        });
        Ok(ClipHandle(self.clips.len() as u32 - 1))
    }

    fn play(&mut self, clip: ClipHandle, _volume: f32, _looping: bool) {
        if let Some(state) = self.clips.get_mut(clip.0 as usize) {
            state.playing = true;
        }
    }

    fn pause(&mut self, clip: ClipHandle) {
        if let Some(state) = self.clips.get_mut(clip.0 as usize) {
            state.playing = false;
        }
    }

    fn stop(&mut self, clip: ClipHandle) {
        if let Some(state) = self.clips.get_mut(clip.0 as usize) {
            state.playing = false;
            state.offset = 0;
        }
    }

    fn sample_offset(&self, clip: ClipHandle) -> u64 {
        self.clips
            .get(clip.0 as usize)
            .map(|c| c.offset)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_play_stop_cycle() {
        let mut backend = NullAudioBackend::default();
        let clip = backend.load_clip("theme.ogg").unwrap();
        assert_eq!(backend.clip_path(clip), Some("theme.ogg"));
        backend.play(clip, 1.0, false);
        assert!(backend.is_playing(clip));
        backend.set_sample_offset(clip, 42);
        backend.stop(clip);
        assert!(!backend.is_playing(clip));
        assert_eq!(backend.sample_offset(clip), 0);
    }

    #[test]
    fn empty_path_is_a_load_error() {
        let mut backend = NullAudioBackend::default();
        assert!(backend.load_clip("").is_err());
    }
}
