// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). All scheduler
//! times are already in milliseconds, so no unit conversion is needed.

use std::io::Write;

use updraft_core::timer::PassKind;
use updraft_core::trace::{
    DelayAdjustedEvent, PassBeginEvent, PassEndEvent, PowerEvent, TimerArmedEvent, TraceSink,
    UpdateRequestedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn pass_name(pass: PassKind) -> &'static str {
    match pass {
        PassKind::Compile => "compile",
        PassKind::Execute => "execute",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_update_requested(&mut self, e: &UpdateRequestedEvent) {
        let _ = writeln!(
            self.writer,
            "[request] root={} flags={:?} immediate={}",
            e.target.0, e.flags, e.immediate,
        );
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let mode = if e.immediate { " (immediate)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[pass:begin] {} at {}ms{mode}",
            pass_name(e.pass),
            e.timestamp.as_millis(),
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] {} roots={} elapsed={}ms",
            pass_name(e.pass),
            e.roots_visited,
            e.elapsed.as_millis(),
        );
    }

    fn on_delay_adjusted(&mut self, e: &DelayAdjustedEvent) {
        let direction = if e.new > e.old { "back-off" } else { "decay" };
        let _ = writeln!(
            self.writer,
            "[delay] {}ms -> {}ms ({direction}, pass took {}ms)",
            e.old.as_millis(),
            e.new.as_millis(),
            e.elapsed.as_millis(),
        );
    }

    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        let _ = writeln!(
            self.writer,
            "[timer] {} in {}ms",
            pass_name(e.pass),
            e.delay.as_millis(),
        );
    }

    fn on_timers_cancelled(&mut self) {
        let _ = writeln!(self.writer, "[timer] cancelled");
    }

    fn on_power(&mut self, e: &PowerEvent) {
        let state = if e.powered { "on" } else { "off" };
        let _ = writeln!(self.writer, "[power] {state} roots={}", e.roots);
    }
}
