// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use updraft_core::component::RootId;
use updraft_core::flags::UpdateFlags;
use updraft_core::time::{Delay, UpdateTime};
use updraft_core::timer::PassKind;
use updraft_core::trace::{
    DelayAdjustedEvent, PassBeginEvent, PassEndEvent, PowerEvent, TimerArmedEvent, TraceSink,
    UpdateRequestedEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_UPDATE_REQUESTED: u8 = 1;
const TAG_PASS_BEGIN: u8 = 2;
const TAG_PASS_END: u8 = 3;
const TAG_DELAY_ADJUSTED: u8 = 4;
const TAG_TIMER_ARMED: u8 = 5;
const TAG_TIMERS_CANCELLED: u8 = 6;
const TAG_POWER: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_pass(&mut self, p: PassKind) {
        self.write_u8(match p {
            PassKind::Compile => 0,
            PassKind::Execute => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_update_requested(&mut self, e: &UpdateRequestedEvent) {
        self.write_u8(TAG_UPDATE_REQUESTED);
        self.write_u64(e.target.0);
        self.write_u32(e.flags.bits());
        self.write_u8(u8::from(e.immediate));
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_pass(e.pass);
        self.write_u8(u8::from(e.immediate));
        self.write_u64(e.timestamp.as_millis());
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_pass(e.pass);
        self.write_u8(u8::from(e.immediate));
        self.write_u32(e.roots_visited);
        self.write_u64(e.elapsed.as_millis());
    }

    fn on_delay_adjusted(&mut self, e: &DelayAdjustedEvent) {
        self.write_u8(TAG_DELAY_ADJUSTED);
        self.write_u64(e.old.as_millis());
        self.write_u64(e.new.as_millis());
        self.write_u64(e.elapsed.as_millis());
    }

    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        self.write_u8(TAG_TIMER_ARMED);
        self.write_pass(e.pass);
        self.write_u64(e.delay.as_millis());
    }

    fn on_timers_cancelled(&mut self) {
        self.write_u8(TAG_TIMERS_CANCELLED);
    }

    fn on_power(&mut self, e: &PowerEvent) {
        self.write_u8(TAG_POWER);
        self.write_u8(u8::from(e.powered));
        self.write_u32(e.roots);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`UpdateRequestedEvent`].
    UpdateRequested(UpdateRequestedEvent),
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`DelayAdjustedEvent`].
    DelayAdjusted(DelayAdjustedEvent),
    /// A [`TimerArmedEvent`].
    TimerArmed(TimerArmedEvent),
    /// Both timer slots were disarmed.
    TimersCancelled,
    /// A [`PowerEvent`].
    Power(PowerEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_pass(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::Compile,
            _ => PassKind::Execute,
        })
    }

    fn decode_update_requested(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UpdateRequested(UpdateRequestedEvent {
            target: RootId(self.read_u64()?),
            flags: UpdateFlags::from_bits_truncate(self.read_u32()?),
            immediate: self.read_u8()? != 0,
        }))
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass: self.read_pass()?,
            immediate: self.read_u8()? != 0,
            timestamp: UpdateTime(self.read_u64()?),
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass: self.read_pass()?,
            immediate: self.read_u8()? != 0,
            roots_visited: self.read_u32()?,
            elapsed: Delay(self.read_u64()?),
        }))
    }

    fn decode_delay_adjusted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DelayAdjusted(DelayAdjustedEvent {
            old: Delay(self.read_u64()?),
            new: Delay(self.read_u64()?),
            elapsed: Delay(self.read_u64()?),
        }))
    }

    fn decode_timer_armed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TimerArmed(TimerArmedEvent {
            pass: self.read_pass()?,
            delay: Delay(self.read_u64()?),
        }))
    }

    fn decode_power(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Power(PowerEvent {
            powered: self.read_u8()? != 0,
            roots: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_UPDATE_REQUESTED => self.decode_update_requested(),
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_DELAY_ADJUSTED => self.decode_delay_adjusted(),
            TAG_TIMER_ARMED => self.decode_timer_armed(),
            TAG_TIMERS_CANCELLED => Some(RecordedEvent::TimersCancelled),
            TAG_POWER => self.decode_power(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
