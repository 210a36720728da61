/*!
 * Command Protocol
 * JSON command and reply messages for a UI driver
 *
 * Transport-free: a driver hands `dispatch` the text of one message and sends
 * back the serialized reply. Command replies are produced once the deferred
 * outcome is released.
 *
 * ```text
 * {"command":"runGc"}
 * {"command":"updateSettings","settings":{"memoryThreshold":80}}
 * ```
 */

use crate::core::errors::{SerializableError, TelemetryError, TelemetryResult};
use crate::telemetry::settings::{Settings, SettingsUpdate};
use crate::telemetry::traits::TelemetryBackend;
use crate::telemetry::types::{
    CollectionOutcome, DefragmentationOutcome, OptimizationOutcome, TelemetrySnapshot,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinSet;

/// Messages accepted from a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ClientCommand {
    RunGc,
    OptimizeMemory,
    DefragmentMemory,
    UpdateSettings { settings: SettingsUpdate },
    Snapshot,
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::RunGc => "runGc",
            ClientCommand::OptimizeMemory => "optimizeMemory",
            ClientCommand::DefragmentMemory => "defragmentMemory",
            ClientCommand::UpdateSettings { .. } => "updateSettings",
            ClientCommand::Snapshot => "snapshot",
        }
    }
}

/// Replies sent back to a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerReply {
    Collection(CollectionOutcome),
    Optimization(OptimizationOutcome),
    Defragmentation(DefragmentationOutcome),
    Settings(Settings),
    Snapshot(Box<TelemetrySnapshot>),
    Error(SerializableError),
}

impl ServerReply {
    pub fn is_error(&self) -> bool {
        matches!(self, ServerReply::Error(_))
    }

    /// Encode for the wire; a failure here is the server's, not the client's
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<TelemetryError> for ServerReply {
    fn from(err: TelemetryError) -> Self {
        ServerReply::Error(SerializableError::from(&err))
    }
}

pub fn parse_command(raw: &str) -> TelemetryResult<ClientCommand> {
    Ok(serde_json::from_str(raw)?)
}

/// Parse one message, run it against `backend` and build the reply
pub async fn dispatch<B: TelemetryBackend>(backend: &B, raw: &str) -> ServerReply {
    match parse_command(raw) {
        Ok(command) => handle_command(backend, command).await,
        Err(e) => {
            warn!("Rejected message: {}", e);
            e.into()
        }
    }
}

/// Run a parsed command, waiting out any deferred outcome
pub async fn handle_command<B: TelemetryBackend>(backend: &B, command: ClientCommand) -> ServerReply {
    debug!("Handling {} command", command.name());

    let reply = match command {
        ClientCommand::RunGc => backend
            .run_collection()
            .map(|pending| pending.map(ServerReply::Collection)),
        ClientCommand::OptimizeMemory => backend
            .optimize_memory()
            .map(|pending| pending.map(ServerReply::Optimization)),
        ClientCommand::DefragmentMemory => backend
            .defragment_memory()
            .map(|pending| pending.map(ServerReply::Defragmentation)),
        ClientCommand::UpdateSettings { settings } => {
            return match backend.update_settings(&settings) {
                Ok(merged) => ServerReply::Settings(merged),
                Err(e) => e.into(),
            };
        }
        ClientCommand::Snapshot => return ServerReply::Snapshot(Box::new(backend.snapshot())),
    };

    match reply {
        Ok(pending) => pending.await,
        Err(e) => e.into(),
    }
}

/// Commands in flight for one driver connection
///
/// Each submitted message runs as its own task, so a long collection does not
/// hold up later commands. Replies come back in completion order.
pub struct CommandRunner<B> {
    backend: B,
    tasks: JoinSet<ServerReply>,
}

impl<B: TelemetryBackend + 'static> CommandRunner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tasks: JoinSet::new(),
        }
    }

    /// Start handling one raw message; must be called inside a tokio runtime
    pub fn submit(&mut self, raw: String) {
        let backend = self.backend.clone();
        self.tasks.spawn(async move { dispatch(&backend, &raw).await });
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Next finished reply, or `None` when nothing is in flight
    pub async fn next_reply(&mut self) -> Option<ServerReply> {
        loop {
            match self.tasks.join_next().await? {
                Ok(reply) => return Some(reply),
                Err(e) => warn!("Command task failed: {}", e),
            }
        }
    }

    /// Collect the replies that finish within `grace`, abort the rest
    ///
    /// Returns the delivered replies and how many commands were abandoned.
    pub async fn drain(&mut self, grace: Duration) -> (Vec<ServerReply>, usize) {
        let mut replies = Vec::new();
        let deadline = tokio::time::Instant::now() + grace;

        while !self.tasks.is_empty() {
            match tokio::time::timeout_at(deadline, self.next_reply()).await {
                Ok(Some(reply)) => replies.push(reply),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        let abandoned = self.tasks.len();
        if abandoned > 0 {
            warn!(
                "Dropping {} pending command repl{} at shutdown",
                abandoned,
                if abandoned == 1 { "y" } else { "ies" }
            );
            self.tasks.shutdown().await;
        }
        (replies, abandoned)
    }
}
