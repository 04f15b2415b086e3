//! Event loop that owns [`DirectoryState`] and performs its I/O.
//!
//! One task owns the state. Commands from the shell, I/O completions and
//! timer deadlines are multiplexed with `tokio::select!`; every store,
//! upload or geocoding call runs on its own spawned task and reports back
//! through the completion channel, so slow I/O never blocks input.

use std::future::Future;
use std::sync::Arc;

use radar_core::{LandingConfig, SectorFilter};
use radar_storage::ImageFile;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::admin::{ImageSlot, PartnerDraft};
use crate::cache::LocalCache;
use crate::ports::{ImageUploader, LocationResolver, PartnerStore};
use crate::state::{Completion, DirectoryState, Effect, MutationKind, Tab, ViewUpdate};
use crate::toast::ToastId;

const COMMAND_BUFFER: usize = 64;

/// Edits applied to the open draft inside the runtime task.
pub type DraftEdit = Box<dyn FnOnce(&mut PartnerDraft) + Send>;

/// Input from the shell.
pub enum Command {
    Search(String),
    ClearSearch,
    Sector(SectorFilter),
    Select(String),
    ClearSelection,
    Recenter,
    Tab(Tab),
    DismissToast(ToastId),
    Refresh,
    TapLogo,
    Passcode(String),
    ClosePrompt,
    BeginCreate,
    BeginEdit(String),
    EditDraft(DraftEdit),
    CancelEdit,
    SubmitPartner,
    DeletePartner(String),
    UploadImage { slot: ImageSlot, file: ImageFile },
    ResolveLocation(String),
    UpdateLanding(LandingConfig),
    CloseAdmin,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub passcode: String,
    /// Store key of the landing configuration row.
    pub landing_key: String,
    pub cache: LocalCache,
}

/// The runtime task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("directory runtime has stopped")]
pub struct RuntimeClosed;

/// Cheap handle for sending [`Command`]s. The runtime stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the runtime task has exited.
    pub async fn send(&self, command: Command) -> Result<(), RuntimeClosed> {
        self.tx.send(command).await.map_err(|_| RuntimeClosed)
    }
}

/// Starts the runtime on the current tokio runtime.
///
/// Returns the command handle, the stream of view updates, and the task
/// handle, which resolves once every [`RuntimeHandle`] is dropped.
pub fn spawn<S, U, R>(
    config: RuntimeConfig,
    store: S,
    uploader: U,
    resolver: R,
) -> (
    RuntimeHandle,
    mpsc::UnboundedReceiver<ViewUpdate>,
    JoinHandle<()>,
)
where
    S: PartnerStore,
    U: ImageUploader,
    R: LocationResolver,
{
    let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
    let (updates, updates_rx) = mpsc::unbounded_channel();
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();

    let runtime = Runtime {
        state: DirectoryState::new(config.passcode, Instant::now()),
        store: Arc::new(store),
        uploader: Arc::new(uploader),
        resolver: Arc::new(resolver),
        cache: config.cache,
        landing_key: config.landing_key,
        commands,
        completions_tx,
        completions_rx,
        updates,
    };
    let task = tokio::spawn(runtime.run());
    (RuntimeHandle { tx }, updates_rx, task)
}

struct Runtime<S, U, R> {
    state: DirectoryState,
    store: Arc<S>,
    uploader: Arc<U>,
    resolver: Arc<R>,
    cache: LocalCache,
    landing_key: String,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    updates: mpsc::UnboundedSender<ViewUpdate>,
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<S, U, R> Runtime<S, U, R>
where
    S: PartnerStore,
    U: ImageUploader,
    R: LocationResolver,
{
    async fn run(mut self) {
        match self.cache.load() {
            Ok(Some(config)) => self.state.restore_landing(config),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable landing cache"),
        }
        self.state.refresh();
        tracing::info!("directory runtime started");

        loop {
            self.flush();
            let deadline = self.state.next_deadline();
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle(command, Instant::now());
                }
                Some(done) = self.completions_rx.recv() => {
                    self.state.complete(done, Instant::now());
                }
                () = sleep_until_deadline(deadline) => {
                    self.state.tick(Instant::now());
                }
            }
        }
        self.flush();
        tracing::info!("directory runtime stopped");
    }

    fn handle(&mut self, command: Command, now: Instant) {
        let state = &mut self.state;
        let result: Result<(), String> = match command {
            Command::Search(text) => {
                state.set_search(text, now);
                Ok(())
            }
            Command::ClearSearch => {
                state.clear_search();
                Ok(())
            }
            Command::Sector(sector) => {
                state.set_sector(sector);
                Ok(())
            }
            Command::Select(id) => state.select(&id).map_err(|e| e.to_string()),
            Command::ClearSelection => {
                state.clear_selection();
                Ok(())
            }
            Command::Recenter => {
                state.recenter();
                Ok(())
            }
            Command::Tab(tab) => {
                state.set_tab(tab);
                Ok(())
            }
            Command::DismissToast(id) => {
                state.dismiss_toast(id);
                Ok(())
            }
            Command::Refresh => {
                state.refresh();
                Ok(())
            }
            Command::TapLogo => {
                state.tap_logo(now);
                Ok(())
            }
            Command::Passcode(code) => {
                state.submit_passcode(&code, now);
                Ok(())
            }
            Command::ClosePrompt => {
                state.close_prompt();
                Ok(())
            }
            Command::BeginCreate => state.begin_create().map_err(|e| e.to_string()),
            Command::BeginEdit(id) => state.begin_edit(&id).map_err(|e| e.to_string()),
            Command::EditDraft(edit) => state.edit_draft(edit).map_err(|e| e.to_string()),
            Command::CancelEdit => state.cancel_edit().map_err(|e| e.to_string()),
            Command::SubmitPartner => state
                .submit_partner(chrono::Utc::now())
                .map_err(|e| e.to_string()),
            Command::DeletePartner(id) => state.delete_partner(&id).map_err(|e| e.to_string()),
            Command::UploadImage { slot, file } => {
                state.upload_image(slot, file).map_err(|e| e.to_string())
            }
            Command::ResolveLocation(input) => {
                state.resolve_location(&input).map_err(|e| e.to_string())
            }
            Command::UpdateLanding(config) => {
                state.update_landing(config).map_err(|e| e.to_string())
            }
            Command::CloseAdmin => {
                state.close_admin();
                Ok(())
            }
        };
        if let Err(message) = result {
            tracing::debug!(%message, "command rejected");
            state.reject(message);
        }
    }

    /// Starts queued effects and forwards queued view updates.
    fn flush(&mut self) {
        for effect in self.state.take_effects() {
            self.dispatch(effect);
        }
        for update in self.state.take_updates() {
            if self.updates.send(update).is_err() {
                break;
            }
        }
    }

    fn spawn_io<F>(&self, io: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let done = io.await;
            if tx.send(done).is_err() {
                tracing::debug!("runtime stopped; dropping I/O result");
            }
        });
    }

    fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::CacheLanding(config) => {
                if let Err(e) = self.cache.store(&config) {
                    tracing::warn!(error = %e, "failed to cache landing config");
                }
            }
            Effect::FetchPartners(generation) => {
                let store = Arc::clone(&self.store);
                self.spawn_io(async move {
                    Completion::Partners {
                        generation,
                        result: store.list_partners().await,
                    }
                });
            }
            Effect::FetchLanding(generation) => {
                let store = Arc::clone(&self.store);
                let key = self.landing_key.clone();
                self.spawn_io(async move {
                    Completion::Landing {
                        generation,
                        result: store.get_landing(&key).await,
                    }
                });
            }
            Effect::InsertPartner(partner) => {
                let store = Arc::clone(&self.store);
                self.spawn_io(async move {
                    Completion::Mutation {
                        kind: MutationKind::Insert,
                        result: store.insert_partner(&partner).await,
                    }
                });
            }
            Effect::UpdatePartner { id, partner } => {
                let store = Arc::clone(&self.store);
                self.spawn_io(async move {
                    Completion::Mutation {
                        kind: MutationKind::Update,
                        result: store.update_partner(&id, &partner).await,
                    }
                });
            }
            Effect::DeletePartner(id) => {
                let store = Arc::clone(&self.store);
                self.spawn_io(async move {
                    Completion::Mutation {
                        kind: MutationKind::Delete,
                        result: store.delete_partner(&id).await,
                    }
                });
            }
            Effect::UpsertLanding(config) => {
                let store = Arc::clone(&self.store);
                let key = self.landing_key.clone();
                self.spawn_io(async move {
                    Completion::LandingSaved(store.upsert_landing(&key, &config).await)
                });
            }
            Effect::Upload { slot, file } => {
                let uploader = Arc::clone(&self.uploader);
                self.spawn_io(async move {
                    Completion::Uploaded {
                        slot,
                        result: uploader.upload_image(file).await,
                    }
                });
            }
            Effect::Resolve {
                token,
                input,
                query,
            } => {
                let resolver = Arc::clone(&self.resolver);
                self.spawn_io(async move {
                    let coordinates = resolver.resolve_location(&query).await;
                    Completion::Resolved {
                        token,
                        input,
                        coordinates,
                    }
                });
            }
        }
    }
}
