use log::trace;
use uuid::Uuid;

use crate::components::audio::{AudioBackend, ClipHandle};
use crate::definitions::asset::AudioMarker;
use crate::entity::event::Event;

pub const ATTR_AUDIO_MARKER: &str = "audio_marker";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// A clip instance bound to one entity. Tracks the playhead between
/// frames so marker crossings fire exactly once per pass (repeat markers
/// re-arm when a looping clip wraps).
pub struct AudioRuntime {
    clip: ClipHandle,
    volume: f32,
    looping: bool,
    markers: Vec<AudioMarker>,
    fired: Vec<bool>,
    last_offset: u64,
    state: PlaybackState,
}

impl AudioRuntime {
    pub fn new(clip: ClipHandle, volume: f32, looping: bool, mut markers: Vec<AudioMarker>) -> Self {
        markers.sort_by_key(|m| m.sample_offset);
        let fired = vec![false; markers.len()];
        AudioRuntime {
            clip,
            volume,
            looping,
            markers,
            fired,
            last_offset: 0,
            state: PlaybackState::Stopped,
        }
    }

    pub fn clip(&self) -> ClipHandle {
        self.clip
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn play(&mut self, backend: &mut dyn AudioBackend) {
        backend.play(self.clip, self.volume, self.looping);
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self, backend: &mut dyn AudioBackend) {
        backend.pause(self.clip);
        self.state = PlaybackState::Paused;
    }

    pub fn stop(&mut self, backend: &mut dyn AudioBackend) {
        backend.stop(self.clip);
        self.state = PlaybackState::Stopped;
        self.last_offset = 0;
        self.fired.fill(false);
    }

    /// Poll the playhead and emit one event per marker crossed since the
    /// previous poll. `sender` is the owning entity's uuid.
    pub fn update(&mut self, backend: &dyn AudioBackend, sender: Uuid) -> Vec<Event> {
        if self.state != PlaybackState::Playing || self.markers.is_empty() {
            return Vec::new();
        }
        let offset = backend.sample_offset(self.clip);
        let wrapped = offset < self.last_offset;
        if wrapped {
            // Looping clip restarted since the last poll; repeat markers
            // become eligible again.
            for (marker, fired) in self.markers.iter().zip(self.fired.iter_mut()) {
                if marker.repeat {
                    *fired = false;
                }
            }
        }
        let mut events = Vec::new();
        for (marker, fired) in self.markers.iter().zip(self.fired.iter_mut()) {
            if *fired {
                continue;
            }
            let crossed = if wrapped {
                marker.sample_offset > self.last_offset || marker.sample_offset <= offset
            } else {
                marker.sample_offset > self.last_offset && marker.sample_offset <= offset
            };
            if crossed {
                trace!("audio marker '{}' crossed at sample {}", marker.name, offset);
                let mut event = Event::new(sender);
                event.set_attribute(ATTR_AUDIO_MARKER, &marker.name);
                events.push(event);
                *fired = true;
            }
        }
        self.last_offset = offset;
        events
    }
}
