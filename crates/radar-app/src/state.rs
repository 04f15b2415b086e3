//! The directory controller.
//!
//! [`DirectoryState`] owns every piece of UI state and is changed only
//! through its transition methods. It performs no I/O: transitions queue
//! [`Effect`]s for the runtime to execute and [`ViewUpdate`]s for the
//! shell to render. Results of I/O come back as [`Completion`]s. Time is
//! passed in explicitly so every timer is a deadline that can be tested
//! with a paused clock.

use chrono::{DateTime, Utc};
use radar_core::{
    filter_partners, Business, Coordinates, DirectoryStats, LandingConfig, SectorFilter,
};
use radar_storage::ImageFile;
use tokio::time::Instant;

use crate::admin::{AdminSession, ImageSlot, PartnerDraft, SubmitAction};
use crate::camera::{recenter_command, CameraCommand, MapSync, Marker};
use crate::debounce::{Debounced, SEARCH_DEBOUNCE};
use crate::error::{AdminError, SelectionError};
use crate::gate::{PasscodeOutcome, UnlockGate};
use crate::ports::{StoreError, UploadError};
use crate::toast::{Toast, ToastId, ToastKind, ToastQueue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Map,
    List,
    Help,
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "map" => Ok(Tab::Map),
            "list" => Ok(Tab::List),
            "help" => Ok(Tab::Help),
            other => Err(format!("unknown tab '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl MutationKind {
    fn success_toast(self) -> (&'static str, ToastKind) {
        match self {
            MutationKind::Insert => ("Partner saved", ToastKind::Success),
            MutationKind::Update => ("Partner updated", ToastKind::Success),
            MutationKind::Delete => ("Partner deleted", ToastKind::Info),
        }
    }
}

/// I/O requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetches are numbered so an answer older than one already applied
    /// can be dropped.
    FetchPartners(u64),
    FetchLanding(u64),
    InsertPartner(Business),
    UpdatePartner { id: String, partner: Business },
    DeletePartner(String),
    UpsertLanding(LandingConfig),
    CacheLanding(LandingConfig),
    Upload { slot: ImageSlot, file: ImageFile },
    Resolve {
        token: u64,
        input: String,
        query: String,
    },
}

/// Result of an [`Effect`], fed back through [`DirectoryState::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// `generation` echoes the [`Effect::FetchPartners`] that produced it.
    Partners {
        generation: u64,
        result: Result<Vec<Business>, StoreError>,
    },
    Landing {
        generation: u64,
        result: Result<Option<LandingConfig>, StoreError>,
    },
    Mutation {
        kind: MutationKind,
        result: Result<(), StoreError>,
    },
    LandingSaved(Result<(), StoreError>),
    Uploaded {
        slot: ImageSlot,
        result: Result<String, UploadError>,
    },
    Resolved {
        token: u64,
        input: String,
        coordinates: Coordinates,
    },
}

/// Something the shell should redraw or show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Visible(Vec<Business>),
    Selection(Option<Business>),
    Markers(Vec<Marker>),
    Camera(CameraCommand),
    Toasts(Vec<Toast>),
    /// Blocking message for the user who started the action.
    Alert(String),
    /// A command was refused; nothing changed.
    Rejected(String),
    PromptShown,
    PromptClosed,
    AdminUnlocked,
    AdminClosed,
    Draft(Option<PartnerDraft>),
    Landing(LandingConfig),
    Stats(DirectoryStats),
    Loading(bool),
    Tab(Tab),
}

#[derive(Debug)]
pub struct DirectoryState {
    partners: Vec<Business>,
    visible: Vec<Business>,
    search: Debounced<String>,
    sector: SectorFilter,
    selected: Option<String>,
    map: MapSync,
    toasts: ToastQueue,
    gate: UnlockGate,
    admin: Option<AdminSession>,
    landing: LandingConfig,
    tab: Tab,
    loading: bool,
    fetch_generation: u64,
    partners_generation: u64,
    landing_generation: u64,
    effects: Vec<Effect>,
    updates: Vec<ViewUpdate>,
}

impl DirectoryState {
    pub fn new(passcode: impl Into<String>, now: Instant) -> Self {
        Self {
            partners: Vec::new(),
            visible: Vec::new(),
            search: Debounced::new(String::new(), SEARCH_DEBOUNCE),
            sector: SectorFilter::All,
            selected: None,
            map: MapSync::default(),
            toasts: ToastQueue::new(now),
            gate: UnlockGate::new(passcode),
            admin: None,
            landing: LandingConfig::default(),
            tab: Tab::Map,
            loading: true,
            fetch_generation: 0,
            partners_generation: 0,
            landing_generation: 0,
            effects: Vec::new(),
            updates: Vec::new(),
        }
    }

    // -- read access ---------------------------------------------------------

    pub fn partners(&self) -> &[Business] {
        &self.partners
    }

    pub fn visible(&self) -> &[Business] {
        &self.visible
    }

    pub fn selected(&self) -> Option<&Business> {
        let id = self.selected.as_deref()?;
        self.visible.iter().find(|b| b.id == id)
    }

    /// The text as typed, ahead of the debounced value used for filtering.
    pub fn search_input(&self) -> &str {
        self.search.raw()
    }

    pub fn active_search(&self) -> &str {
        self.search.settled()
    }

    pub fn sector(&self) -> SectorFilter {
        self.sector
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.visible()
    }

    pub fn landing(&self) -> &LandingConfig {
        &self.landing
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn prompt_open(&self) -> bool {
        self.gate.prompt_open()
    }

    pub fn admin(&self) -> Option<&AdminSession> {
        self.admin.as_ref()
    }

    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats::from_partners(&self.partners)
    }

    // -- outbox --------------------------------------------------------------

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn take_updates(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Earliest pending timer: search debounce, toast expiry, or the
    /// unlock-gesture window.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.search.deadline(),
            self.toasts.next_deadline(),
            self.gate.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fires every timer due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.search.poll(now) {
            tracing::debug!(term = %self.search.settled(), "search settled");
            self.refilter();
        }
        if !self.toasts.expire(now).is_empty() {
            self.push_toasts();
        }
        if self.gate.expire(now) {
            tracing::debug!("unlock sequence timed out");
        }
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        self.updates.push(ViewUpdate::Rejected(message.into()));
    }

    // -- sync ----------------------------------------------------------------

    /// Re-fetches the partner list and the landing configuration.
    pub fn refresh(&mut self) {
        self.fetch_generation += 1;
        self.effects.push(Effect::FetchPartners(self.fetch_generation));
        self.effects.push(Effect::FetchLanding(self.fetch_generation));
    }

    /// Shows a locally cached landing configuration before the store answers.
    pub fn restore_landing(&mut self, config: LandingConfig) {
        if config != self.landing {
            self.landing = config.clone();
            self.updates.push(ViewUpdate::Landing(config));
        }
    }

    pub fn complete(&mut self, completion: Completion, now: Instant) {
        match completion {
            Completion::Partners { generation, .. } if generation <= self.partners_generation => {
                tracing::debug!(generation, "dropping superseded partner fetch");
            }
            Completion::Landing { generation, .. } if generation <= self.landing_generation => {
                tracing::debug!(generation, "dropping superseded landing fetch");
            }
            Completion::Partners { generation, result } => {
                self.partners_generation = generation;
                self.partners_synced(result, now);
            }
            Completion::Landing { generation, result } => {
                self.landing_generation = generation;
                self.landing_synced(result, now);
            }
            Completion::Mutation { kind, result } => {
                match result {
                    Ok(()) => {
                        let (message, toast) = kind.success_toast();
                        self.notify(message, toast, now);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, ?kind, "partner mutation failed");
                        self.notify(format!("Store error: {e}"), ToastKind::Error, now);
                    }
                }
                self.refresh();
            }
            Completion::LandingSaved(Ok(())) => {
                self.notify("Design synced", ToastKind::Success, now);
            }
            Completion::LandingSaved(Err(e)) => {
                tracing::warn!(error = %e, "landing config upsert failed; kept locally");
                self.notify(format!("Saved locally: {e}"), ToastKind::Info, now);
            }
            Completion::Uploaded { slot, result } => self.upload_done(slot, result),
            Completion::Resolved {
                token,
                input,
                coordinates,
            } => {
                let applied = self.admin.as_mut().is_some_and(|a| {
                    a.finish_resolve(token, &input, coordinates.lat, coordinates.lng)
                });
                if applied {
                    self.push_draft();
                } else {
                    tracing::debug!(%coordinates, "dropping superseded location lookup");
                }
            }
        }
    }

    fn partners_synced(&mut self, result: Result<Vec<Business>, StoreError>, now: Instant) {
        match result {
            Ok(partners) => {
                tracing::info!(count = partners.len(), "partners synced");
                self.partners = partners;
                self.refilter();
                let stats = self.stats();
                self.updates.push(ViewUpdate::Stats(stats));
            }
            Err(e) => {
                tracing::error!(error = %e, "partner fetch failed; keeping previous list");
                self.notify(format!("Store error: {e}"), ToastKind::Error, now);
            }
        }
        self.set_loading(false);
    }

    fn landing_synced(&mut self, result: Result<Option<LandingConfig>, StoreError>, now: Instant) {
        match result {
            Ok(Some(config)) => {
                tracing::debug!("landing config synced");
                self.restore_landing(config.clone());
                self.effects.push(Effect::CacheLanding(config));
            }
            Ok(None) => tracing::debug!("no landing config stored; keeping current"),
            Err(e) => {
                tracing::warn!(error = %e, "landing config fetch failed; keeping current");
                self.notify(format!("Store error: {e}"), ToastKind::Error, now);
            }
        }
    }

    // -- filter & selection --------------------------------------------------

    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        self.search.input(text.into(), now);
    }

    /// Empties the search box and refilters at once, dropping any pending
    /// debounced term.
    pub fn clear_search(&mut self) {
        if self.search.reset(String::new()) {
            self.refilter();
        }
    }

    pub fn set_sector(&mut self, sector: SectorFilter) {
        if self.sector != sector {
            self.sector = sector;
            self.refilter();
        }
    }

    /// Focuses a partner from the visible set.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NotVisible`] if `id` is filtered out or unknown;
    /// the current selection is kept.
    pub fn select(&mut self, id: &str) -> Result<(), SelectionError> {
        let Some(partner) = self.visible.iter().find(|b| b.id == id) else {
            return Err(SelectionError::NotVisible(id.to_string()));
        };
        self.updates.push(ViewUpdate::Selection(Some(partner.clone())));
        self.selected = Some(id.to_string());
        self.sync_map();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.updates.push(ViewUpdate::Selection(None));
            self.sync_map();
        }
    }

    pub fn recenter(&mut self) {
        let camera = recenter_command(&self.visible);
        if !camera.is_noop() {
            self.updates.push(ViewUpdate::Camera(camera));
        }
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.updates.push(ViewUpdate::Tab(tab));
        }
    }

    fn refilter(&mut self) {
        let visible = filter_partners(&self.partners, self.search.settled(), self.sector);
        let changed = visible != self.visible;
        self.visible = visible;

        let selection_lost = self
            .selected
            .as_deref()
            .is_some_and(|id| !self.visible.iter().any(|b| b.id == id));
        if selection_lost {
            tracing::debug!("selected partner filtered out; clearing selection");
            self.selected = None;
            self.updates.push(ViewUpdate::Selection(None));
        }
        if changed {
            self.updates.push(ViewUpdate::Visible(self.visible.clone()));
        }
        self.sync_map();
    }

    fn sync_map(&mut self) {
        let selected = self
            .selected
            .as_deref()
            .and_then(|id| self.visible.iter().find(|b| b.id == id));
        let frame = self.map.sync(&self.visible, selected);
        if let Some(markers) = frame.markers {
            self.updates.push(ViewUpdate::Markers(markers));
        }
        if !frame.camera.is_noop() {
            self.updates.push(ViewUpdate::Camera(frame.camera));
        }
    }

    // -- toasts --------------------------------------------------------------

    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) -> ToastId {
        let id = self.toasts.enqueue(message, kind, now);
        self.push_toasts();
        id
    }

    pub fn dismiss_toast(&mut self, id: ToastId) {
        if self.toasts.dismiss(id) {
            self.push_toasts();
        }
    }

    fn push_toasts(&mut self) {
        self.updates
            .push(ViewUpdate::Toasts(self.toasts.visible().to_vec()));
    }

    // -- unlock gate ---------------------------------------------------------

    pub fn tap_logo(&mut self, now: Instant) {
        self.gate.expire(now);
        if self.gate.activate(now) {
            tracing::debug!("unlock prompt shown");
            self.updates.push(ViewUpdate::PromptShown);
        }
    }

    /// Checks a passcode typed into the open prompt. Returns `None` when no
    /// prompt is open.
    pub fn submit_passcode(&mut self, code: &str, now: Instant) -> Option<PasscodeOutcome> {
        if !self.gate.prompt_open() {
            return None;
        }
        let outcome = self.gate.submit(code);
        match outcome {
            PasscodeOutcome::Granted => {
                tracing::info!("admin surface unlocked");
                self.admin.get_or_insert_with(AdminSession::new);
                self.updates.push(ViewUpdate::PromptClosed);
                self.updates.push(ViewUpdate::AdminUnlocked);
                self.notify("Access granted", ToastKind::Success, now);
            }
            PasscodeOutcome::Rejected => {
                tracing::warn!("wrong admin passcode");
                self.notify("Wrong code", ToastKind::Error, now);
            }
        }
        Some(outcome)
    }

    pub fn close_prompt(&mut self) {
        if self.gate.prompt_open() {
            self.gate.close_prompt();
            self.updates.push(ViewUpdate::PromptClosed);
        }
    }

    // -- admin ---------------------------------------------------------------

    fn session(&mut self) -> Result<&mut AdminSession, AdminError> {
        self.admin.as_mut().ok_or(AdminError::Locked)
    }

    fn push_draft(&mut self) {
        let draft = self.admin.as_ref().and_then(|a| a.draft().cloned());
        self.updates.push(ViewUpdate::Draft(draft));
    }

    pub fn close_admin(&mut self) {
        if self.admin.take().is_some() {
            self.updates.push(ViewUpdate::AdminClosed);
        }
    }

    /// # Errors
    ///
    /// [`AdminError::Locked`] before the passcode was accepted.
    pub fn begin_create(&mut self) -> Result<(), AdminError> {
        self.session()?.begin_create();
        self.push_draft();
        Ok(())
    }

    /// Opens the form on a copy of an existing partner.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`], or [`AdminError::NotFound`] for an unknown id.
    pub fn begin_edit(&mut self, id: &str) -> Result<(), AdminError> {
        let partner = self
            .partners
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(id.to_string()))?;
        self.session()?.begin_edit(&partner);
        self.push_draft();
        Ok(())
    }

    /// # Errors
    ///
    /// [`AdminError::Locked`].
    pub fn cancel_edit(&mut self) -> Result<(), AdminError> {
        self.session()?.cancel();
        self.push_draft();
        Ok(())
    }

    /// Applies `edit` to the open draft.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`] or [`AdminError::NoDraft`].
    pub fn edit_draft<F>(&mut self, edit: F) -> Result<(), AdminError>
    where
        F: FnOnce(&mut PartnerDraft),
    {
        let draft = self.session()?.draft_mut().ok_or(AdminError::NoDraft)?;
        edit(draft);
        self.push_draft();
        Ok(())
    }

    /// Validates the draft and queues the insert or full-replace update.
    ///
    /// # Errors
    ///
    /// Any [`AdminError`] from validation; nothing is sent to the store.
    pub fn submit_partner(&mut self, now: DateTime<Utc>) -> Result<(), AdminError> {
        let action = self.session()?.submit(now)?;
        match action {
            SubmitAction::Insert(partner) => {
                tracing::info!(partner_id = %partner.id, "inserting partner");
                self.effects.push(Effect::InsertPartner(partner));
            }
            SubmitAction::Update { id, partner } => {
                tracing::info!(partner_id = %id, "updating partner");
                self.effects.push(Effect::UpdatePartner { id, partner });
            }
        }
        self.push_draft();
        Ok(())
    }

    /// # Errors
    ///
    /// [`AdminError::Locked`], or [`AdminError::NotFound`] for an unknown id.
    pub fn delete_partner(&mut self, id: &str) -> Result<(), AdminError> {
        self.session()?;
        if !self.partners.iter().any(|b| b.id == id) {
            return Err(AdminError::NotFound(id.to_string()));
        }
        tracing::info!(partner_id = %id, "deleting partner");
        self.effects.push(Effect::DeletePartner(id.to_string()));
        Ok(())
    }

    /// Starts an upload into `slot`.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`], or [`AdminError::NoDraft`] for a draft slot
    /// with no form open.
    pub fn upload_image(&mut self, slot: ImageSlot, file: ImageFile) -> Result<(), AdminError> {
        let session = self.session()?;
        if !slot.is_landing() && session.draft().is_none() {
            return Err(AdminError::NoDraft);
        }
        session.upload_started();
        self.effects.push(Effect::Upload { slot, file });
        Ok(())
    }

    /// Geocodes `"<input>, <draft city>"` into the draft.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`], [`AdminError::NoDraft`], or
    /// [`AdminError::EmptyLocation`].
    pub fn resolve_location(&mut self, input: &str) -> Result<(), AdminError> {
        let (token, query) = self.session()?.begin_resolve(input)?;
        self.effects.push(Effect::Resolve {
            token,
            input: input.trim().to_string(),
            query,
        });
        Ok(())
    }

    /// Applies and caches the landing configuration, then upserts it.
    ///
    /// # Errors
    ///
    /// [`AdminError::Locked`].
    pub fn update_landing(&mut self, config: LandingConfig) -> Result<(), AdminError> {
        self.session()?;
        self.apply_landing(config);
        Ok(())
    }

    fn apply_landing(&mut self, config: LandingConfig) {
        self.landing = config.clone();
        self.updates.push(ViewUpdate::Landing(config.clone()));
        self.effects.push(Effect::CacheLanding(config.clone()));
        self.effects.push(Effect::UpsertLanding(config));
    }

    fn upload_done(&mut self, slot: ImageSlot, result: Result<String, UploadError>) {
        if let Some(session) = self.admin.as_mut() {
            session.upload_finished();
        }
        let url = match result {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, %slot, "image upload failed");
                self.updates
                    .push(ViewUpdate::Alert(format!("Upload failed: {e}")));
                return;
            }
        };
        match slot {
            ImageSlot::Hero | ImageSlot::AdBanner => {
                let mut config = self.landing.clone();
                if slot == ImageSlot::Hero {
                    config.hero_image = url;
                } else {
                    config.ad_banner_image = url;
                }
                self.apply_landing(config);
            }
            ImageSlot::Logo | ImageSlot::Gallery(_) => {
                let draft = self.admin.as_mut().and_then(AdminSession::draft_mut);
                if let Some(draft) = draft {
                    draft.set_image(slot, url);
                    self.push_draft();
                } else {
                    tracing::debug!(%slot, "upload finished after the form closed");
                }
            }
        }
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.updates.push(ViewUpdate::Loading(loading));
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
