//! Command and status gateway.
//!
//! Turns inbound bus messages into sensor updates and session transitions, and
//! publishes the completed status once per solved session. The transport is
//! behind [`StatusSink`] so the gateway never depends on a live broker.

use std::sync::Arc;

use crossbeam::channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::SolvedNotice;
use crate::error::{BusError, PayloadError};
use crate::params::Topics;
use crate::session::{Phase, SensorReading, SharedState};

/// Session commands accepted on the control topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
}

impl Command {
    /// Case-insensitive command name; `stop` is an alias for `reset`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "reset" | "stop" => Some(Command::Reset),
            _ => None,
        }
    }

    /// Decode `{"command": "..."}`; unrecognized names come back as `Err(name)`
    pub fn parse(payload: &str) -> Result<Result<Self, String>, PayloadError> {
        let message: ControlMessage = serde_json::from_str(payload)?;
        Ok(Self::from_name(&message.command).ok_or(message.command))
    }
}

#[derive(Debug, Deserialize)]
struct ControlMessage {
    #[serde(default)]
    command: String,
}

#[derive(Debug, Deserialize)]
struct ChannelControlMessage {
    #[serde(default)]
    control: String,
}

/// Outbound status payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
}

impl StatusMessage {
    pub const fn completed() -> Self {
        Self {
            status: "completed",
        }
    }
}

/// Where status messages go
pub trait StatusSink {
    fn publish_status(&self, status: &StatusMessage) -> Result<(), BusError>;
}

/// What an inbound message turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Reading(SensorReading),
    Command(Command),
    /// Unrecognized command name
    UnknownCommand(String),
    /// Per-channel control message, logged only
    ChannelControl(String),
    /// Malformed payload or unknown topic; state unchanged
    Dropped,
}

/// Applies inbound messages to the shared session state
pub struct Gateway {
    shared: Arc<SharedState>,
    topics: Topics,
    full_scale: u32,
}

impl Gateway {
    pub fn new(shared: Arc<SharedState>, topics: Topics, full_scale: u32) -> Self {
        Self {
            shared,
            topics,
            full_scale,
        }
    }

    /// Decode and apply one inbound message. Malformed input is logged and dropped.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Inbound {
        let inbound = match self.decode(topic, payload) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!("Dropping payload on {}: {}", topic, e);
                return Inbound::Dropped;
            }
        };

        match &inbound {
            Inbound::Reading(reading) => {
                self.shared.store_reading(*reading);
                debug!("Reading {}", reading);
            }
            Inbound::Command(Command::Start) => {
                let session = self.shared.start();
                info!("Start command received, session {} armed", session.epoch);
            }
            Inbound::Command(Command::Reset) => {
                let session = self.shared.reset();
                info!("Reset command received, session {} idle; waiting for start", session.epoch);
            }
            Inbound::UnknownCommand(name) => {
                warn!("Ignoring unknown command {:?}", name);
            }
            Inbound::ChannelControl(control) => {
                info!("Channel control on {}: {}", topic, control);
            }
            Inbound::Dropped => {
                warn!("Message on unknown topic {}", topic);
            }
        }

        inbound
    }

    fn decode(&self, topic: &str, payload: &[u8]) -> Result<Inbound, PayloadError> {
        let text = std::str::from_utf8(payload)?.trim();

        if topic == self.topics.values {
            Ok(Inbound::Reading(SensorReading::parse(text, self.full_scale)?))
        } else if topic == self.topics.control {
            Ok(match Command::parse(text)? {
                Ok(command) => Inbound::Command(command),
                Err(name) => Inbound::UnknownCommand(name),
            })
        } else if topic == self.topics.channel_control {
            let message: ChannelControlMessage = serde_json::from_str(text)?;
            Ok(Inbound::ChannelControl(message.control.to_lowercase()))
        } else {
            Ok(Inbound::Dropped)
        }
    }
}

/// Publish the completed status for the live session, if it is solved and
/// nobody has yet.
///
/// Notices only wake the status thread: the session itself decides which
/// epoch is claimed, so a stale or dropped notice cannot lose a publication.
/// Returns true if this call claimed and attempted the publication.
pub fn deliver_status(shared: &SharedState, sink: &dyn StatusSink) -> bool {
    let session = shared.session();
    if session.phase != (Phase::Solved { status_sent: false }) {
        debug!("Session {} needs no status ({:?})", session.epoch, session.phase);
        return false;
    }
    if !shared.claim_status(session.epoch) {
        debug!("Status for session {} already handled", session.epoch);
        return false;
    }

    let status = StatusMessage::completed();
    match sink.publish_status(&status) {
        Ok(()) => info!("Status published for session {}: {}", session.epoch, status.status),
        Err(e) => warn!("Could not publish status for session {}: {}", session.epoch, e),
    }
    true
}

/// Publish status on every solve notice until the sender side is dropped
pub fn run_status_loop(shared: &SharedState, notices: Receiver<SolvedNotice>, sink: &dyn StatusSink) {
    for notice in notices.iter() {
        debug!("Solve notice from session {}", notice.epoch);
        deliver_status(shared, sink);
    }
}
