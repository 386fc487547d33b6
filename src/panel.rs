// src/panel.rs
// Sequences one operator intent end to end: busy tracking, notices, draft
// persistence, the daemon call, and rendering of its result.

use crate::{
    app::AppState,
    busy::{BusyGuard, BusyTracker},
    drafts::{DraftStore, LAST_MODEL_KEY, LAST_PROMPT_KEY},
    error::ApiError,
    listing,
    remote_api::{ConfigSnapshot, ConfigUpdate, ExecResult, RemoteClient},
};
use tracing::{debug, error, info, warn};

pub const MSG_LOADING: &str = "Loading";
pub const MSG_WORKING: &str = "Working";
pub const MSG_SAVED: &str = "Saved";

/// One operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ListModels,
    RunPrompt { model: String, prompt: String },
    PullModel { model: String },
    SaveConfig(ConfigUpdate),
    LoadConfig,
}

impl Intent {
    /// Label used in the rendered output block.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::ListModels => "list",
            Intent::RunPrompt { .. } => "run",
            Intent::PullModel { .. } => "pull",
            Intent::SaveConfig(_) | Intent::LoadConfig => "config",
        }
    }

    fn notice(&self) -> &'static str {
        match self {
            Intent::ListModels | Intent::LoadConfig => MSG_LOADING,
            _ => MSG_WORKING,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// `seq` orders overlapping list calls.
    Listed { seq: u64, result: ExecResult },
    Executed(ExecResult),
    Saved { ack: ExecResult, snapshot: ConfigSnapshot },
    ConfigLoaded(ConfigSnapshot),
}

/// How [`Panel::finish`] disposed of a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Succeeded { exit_code: Option<i32> },
    Failed,
    /// A list result older than one already applied.
    Discarded,
}

/// A call that has been started but not yet sent. Holds the busy slot until
/// its [`Completion`] is finished or dropped.
#[derive(Debug)]
pub struct PendingCall {
    client: RemoteClient,
    intent: Intent,
    seq: u64,
    guard: BusyGuard,
}

impl PendingCall {
    /// Performs the daemon call. This is the only suspension point of an
    /// intent and may run on any task.
    pub async fn resolve(self) -> Completion {
        let PendingCall {
            client,
            intent,
            seq,
            guard,
        } = self;
        let label = intent.label();
        debug!(label, "dispatching call");

        let outcome = match intent {
            Intent::ListModels => client
                .list()
                .await
                .map(|result| Outcome::Listed { seq, result }),
            Intent::RunPrompt { model, prompt } => {
                client.run(&model, &prompt).await.map(Outcome::Executed)
            }
            Intent::PullModel { model } => client.pull(&model).await.map(Outcome::Executed),
            Intent::SaveConfig(update) => match client.set_config(&update).await {
                Ok(ack) => client
                    .get_config()
                    .await
                    .map(|snapshot| Outcome::Saved { ack, snapshot }),
                Err(e) => Err(e),
            },
            Intent::LoadConfig => client.get_config().await.map(Outcome::ConfigLoaded),
        };

        Completion {
            label,
            outcome,
            guard,
        }
    }
}

#[derive(Debug)]
pub struct Completion {
    pub label: &'static str,
    pub outcome: Result<Outcome, ApiError>,
    guard: BusyGuard,
}

/// The orchestration façade. Owns the panel state it renders into; all
/// mutation happens through `begin` and `finish` on one task.
#[derive(Debug)]
pub struct Panel {
    client: RemoteClient,
    busy: BusyTracker,
    drafts: DraftStore,
    state: AppState,
    issued_list_seq: u64,
    applied_list_seq: u64,
}

impl Panel {
    /// Builds the façade and prepopulates empty inputs from saved drafts.
    pub fn new(client: RemoteClient, drafts: DraftStore, mut state: AppState) -> Self {
        state.restore_drafts(drafts.get(LAST_MODEL_KEY), drafts.get(LAST_PROMPT_KEY));
        Self {
            client,
            busy: BusyTracker::new(),
            drafts,
            state,
            issued_list_seq: 0,
            applied_list_seq: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_count(&self) -> usize {
        self.busy.count()
    }

    /// Enters busy, shows the progress notice and persists drafts. Drafts
    /// are written before the call is issued so the last input survives a
    /// call that never returns.
    pub fn begin(&mut self, intent: Intent) -> PendingCall {
        let guard = self.busy.enter();
        self.state.notify(intent.notice());
        self.persist_drafts(&intent);

        let seq = if matches!(intent, Intent::ListModels) {
            self.issued_list_seq += 1;
            self.issued_list_seq
        } else {
            0
        };

        PendingCall {
            client: self.client.clone(),
            intent,
            seq,
            guard,
        }
    }

    /// Applies a completed call to the panel state and releases its busy
    /// slot.
    pub fn finish(&mut self, completion: Completion) -> CallStatus {
        let Completion {
            label,
            outcome,
            guard,
        } = completion;

        let status = match outcome {
            Ok(Outcome::Listed { seq, .. }) if seq < self.applied_list_seq => {
                warn!(seq, newest = self.applied_list_seq, "discarding stale list result");
                CallStatus::Discarded
            }
            Ok(Outcome::Listed { seq, result }) => {
                self.applied_list_seq = seq;
                self.state.show_output(Some(label), &result);
                let models = listing::parse(result.output.as_deref().unwrap_or_default());
                info!(count = models.len(), "model list refreshed");
                self.state.replace_models(models);
                CallStatus::Succeeded {
                    exit_code: result.exit_code,
                }
            }
            Ok(Outcome::Executed(result)) => {
                info!(label, exit_code = ?result.exit_code, "call completed");
                self.state.show_output(Some(label), &result);
                CallStatus::Succeeded {
                    exit_code: result.exit_code,
                }
            }
            Ok(Outcome::Saved { ack, snapshot }) => {
                info!("configuration saved");
                self.state.apply_config(snapshot);
                self.state.notify(MSG_SAVED);
                self.state.output = MSG_SAVED.to_string();
                CallStatus::Succeeded {
                    exit_code: ack.exit_code,
                }
            }
            Ok(Outcome::ConfigLoaded(snapshot)) => {
                debug!(?snapshot, "configuration loaded");
                self.state.apply_config(snapshot);
                CallStatus::Succeeded { exit_code: None }
            }
            Err(err) => {
                let message = err.to_string();
                error!(label, status = ?err.status(), "call failed: {message}");
                self.state.show_output(Some(label), &ExecResult::failure(&message));
                self.state.notify(message);
                CallStatus::Failed
            }
        };

        drop(guard);
        status
    }

    /// Runs one intent to completion on the current task.
    pub async fn execute(&mut self, intent: Intent) -> CallStatus {
        let completion = self.begin(intent).resolve().await;
        self.finish(completion)
    }

    fn persist_drafts(&mut self, intent: &Intent) {
        let pairs: Vec<(&str, &str)> = match intent {
            Intent::RunPrompt { model, prompt } => {
                vec![(LAST_MODEL_KEY, model.as_str()), (LAST_PROMPT_KEY, prompt.as_str())]
            }
            Intent::PullModel { model } => vec![(LAST_MODEL_KEY, model.as_str())],
            _ => return,
        };
        if let Err(e) = self.drafts.set_all(&pairs) {
            warn!(error = %e, "failed to persist drafts");
        }
    }
}
