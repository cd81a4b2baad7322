// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use updraft_core::timer::PassKind;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Pass begin/end pairs become duration slices. A pass end carries only its
/// elapsed time, so its slice close is placed at the matching begin timestamp
/// plus that elapsed time. Timestamps are milliseconds in the recording and
/// microseconds in the output.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Begin timestamps per pass, for closing duration slices.
    let mut open: [Option<u64>; 2] = [None, None];
    let mut last_ts: u64 = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::UpdateRequested(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "UpdateRequested",
                    "cat": "Scheduler",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "root": e.target.0,
                        "flags": format!("{:?}", e.flags),
                        "immediate": e.immediate,
                    }
                }));
            }
            RecordedEvent::PassBegin(e) => {
                let ts = e.timestamp.as_millis();
                open[slot(e.pass)] = Some(ts);
                last_ts = ts;
                events.push(json!({
                    "ph": "B",
                    "name": pass_name(e.pass),
                    "cat": "Pass",
                    "ts": ms_to_us(ts),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "immediate": e.immediate,
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                let begin = open[slot(e.pass)].take().unwrap_or(last_ts);
                let ts = begin + e.elapsed.as_millis();
                last_ts = ts;
                events.push(json!({
                    "ph": "E",
                    "name": pass_name(e.pass),
                    "cat": "Pass",
                    "ts": ms_to_us(ts),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "roots_visited": e.roots_visited,
                        "elapsed_ms": e.elapsed.as_millis(),
                    }
                }));
            }
            RecordedEvent::DelayAdjusted(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DelayAdjusted",
                    "cat": "Scheduler",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "old_ms": e.old.as_millis(),
                        "new_ms": e.new.as_millis(),
                        "elapsed_ms": e.elapsed.as_millis(),
                    }
                }));
            }
            RecordedEvent::TimerArmed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TimerArmed",
                    "cat": "Scheduler",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass": pass_name(e.pass),
                        "delay_ms": e.delay.as_millis(),
                    }
                }));
            }
            RecordedEvent::TimersCancelled => {
                events.push(json!({
                    "ph": "i",
                    "name": "TimersCancelled",
                    "cat": "Scheduler",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {}
                }));
            }
            RecordedEvent::Power(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": if e.powered { "PowerOn" } else { "PowerOff" },
                    "cat": "Power",
                    "ts": ms_to_us(last_ts),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "roots": e.roots,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn pass_name(pass: PassKind) -> &'static str {
    match pass {
        PassKind::Compile => "Compile",
        PassKind::Execute => "Execute",
    }
}

fn slot(pass: PassKind) -> usize {
    match pass {
        PassKind::Compile => 0,
        PassKind::Execute => 1,
    }
}

fn ms_to_us(ms: u64) -> u64 {
    ms.saturating_mul(1000)
}
