//! Animation playback state: current frame, play/pause, speed.

use std::time::Duration;

const SPEED_STEP_MS: u64 = 25;
const MIN_SPEED_MS: u64 = 25;
const MAX_SPEED_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    index: usize,
    len: usize,
    playing: bool,
    speed_ms: u64,
}

impl Playback {
    pub fn new(len: usize, speed_ms: u64) -> Self {
        Self {
            index: 0,
            len,
            playing: len > 1,
            speed_ms: speed_ms.clamp(MIN_SPEED_MS, MAX_SPEED_MS),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    /// Advance one frame while playing; wraps to the start.
    pub fn tick(&mut self) {
        if self.playing && self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing && self.len > 1;
    }

    /// Manual step; pauses playback.
    pub fn step(&mut self, delta: isize) {
        self.playing = false;
        if self.len == 0 {
            return;
        }
        let len = self.len as isize;
        self.index = (self.index as isize + delta).rem_euclid(len) as usize;
    }

    pub fn first(&mut self) {
        self.playing = false;
        self.index = 0;
    }

    pub fn last(&mut self) {
        self.playing = false;
        self.index = self.len.saturating_sub(1);
    }

    pub fn faster(&mut self) {
        self.speed_ms = self.speed_ms.saturating_sub(SPEED_STEP_MS).max(MIN_SPEED_MS);
    }

    pub fn slower(&mut self) {
        self.speed_ms = (self.speed_ms + SPEED_STEP_MS).min(MAX_SPEED_MS);
    }

    /// New frame set (after a reload or range change): restart from the first frame.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.index = 0;
        if len <= 1 {
            self.playing = false;
        }
    }
}
