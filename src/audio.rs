//! Sound cue dispatch.
//!
//! The controller never plays samples itself. It drives a [`SoundBoard`]
//! resource that tracks which channel is playing and at what pitch, and queues
//! [`SoundCue`]s for whatever audio backend the game uses. The plugin inserts
//! one board; insert your own before adding the plugin to seed it.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Audio channels used by the controller.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundChannel {
    /// Web shot.
    Web,
    /// Footsteps loop while running.
    Running,
    /// Climbing loop.
    Climbing,
    /// Landing thud.
    Foot,
}

impl SoundChannel {
    pub const ALL: [SoundChannel; 4] = [
        SoundChannel::Web,
        SoundChannel::Running,
        SoundChannel::Climbing,
        SoundChannel::Foot,
    ];

    fn index(self) -> usize {
        match self {
            SoundChannel::Web => 0,
            SoundChannel::Running => 1,
            SoundChannel::Climbing => 2,
            SoundChannel::Foot => 3,
        }
    }
}

/// Instruction for the audio backend.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SoundCue {
    /// Start (or restart) the channel at `pitch`.
    Play { channel: SoundChannel, pitch: f32 },
    /// Stop the channel.
    Stop { channel: SoundChannel },
    /// Change the pitch of a channel that is already playing.
    Pitch { channel: SoundChannel, pitch: f32 },
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    playing: bool,
    pitch: f32,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            playing: false,
            pitch: 1.0,
        }
    }
}

/// Playback state of every controller sound channel.
#[derive(Resource)]
pub struct SoundBoard {
    channels: [ChannelState; 4],
    rng: StdRng,
    pending: Vec<SoundCue>,
}

impl Default for SoundBoard {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl SoundBoard {
    /// Create a board with deterministic pitch variation.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            channels: [ChannelState::default(); 4],
            rng,
            pending: Vec::new(),
        }
    }

    pub fn is_playing(&self, channel: SoundChannel) -> bool {
        self.channels[channel.index()].playing
    }

    pub fn pitch(&self, channel: SoundChannel) -> f32 {
        self.channels[channel.index()].pitch
    }

    /// Start the channel, restarting it if it is already playing.
    pub fn play(&mut self, channel: SoundChannel) {
        let state = &mut self.channels[channel.index()];
        state.playing = true;
        let pitch = state.pitch;
        self.pending.push(SoundCue::Play { channel, pitch });
    }

    /// Start the channel unless it is already playing. Returns whether it started.
    pub fn play_if_idle(&mut self, channel: SoundChannel) -> bool {
        if self.is_playing(channel) {
            return false;
        }
        self.play(channel);
        true
    }

    /// Stop the channel. Stopping a silent channel does nothing.
    pub fn stop(&mut self, channel: SoundChannel) {
        let state = &mut self.channels[channel.index()];
        if state.playing {
            state.playing = false;
            self.pending.push(SoundCue::Stop { channel });
        }
    }

    /// Stop every channel.
    pub fn stop_all(&mut self) {
        for channel in SoundChannel::ALL {
            self.stop(channel);
        }
    }

    /// Report that a one-shot clip ended on its own. Does not queue a cue.
    pub fn mark_finished(&mut self, channel: SoundChannel) {
        self.channels[channel.index()].playing = false;
    }

    /// Set the channel pitch. A playing channel gets a [`SoundCue::Pitch`].
    pub fn set_pitch(&mut self, channel: SoundChannel, pitch: f32) {
        let state = &mut self.channels[channel.index()];
        if state.pitch == pitch {
            return;
        }
        state.pitch = pitch;
        if state.playing {
            self.pending.push(SoundCue::Pitch { channel, pitch });
        }
    }

    /// Pick a random pitch in `[min, max]` for the channel and return it.
    pub fn randomize_pitch(&mut self, channel: SoundChannel, (min, max): (f32, f32)) -> f32 {
        let pitch = if min < max {
            self.rng.gen_range(min..=max)
        } else {
            min
        };
        self.set_pitch(channel, pitch);
        pitch
    }

    /// Take all queued cues.
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.pending)
    }
}
