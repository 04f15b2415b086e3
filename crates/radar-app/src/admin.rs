//! Partner edit session for the admin surface.

use chrono::{DateTime, Utc};
use radar_core::{generate_partner_id, Business, PartnerStatus, Sector};

use crate::error::AdminError;

pub const DEFAULT_CITY: &str = "San Luis Potosí";
pub const DEFAULT_LAT: f64 = 22.15;
pub const DEFAULT_LNG: f64 = -100.98;
/// Number of gallery photo slots on a partner form.
pub const GALLERY_SLOTS: usize = 2;

/// Where an uploaded image URL is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Logo,
    Gallery(usize),
    Hero,
    AdBanner,
}

impl ImageSlot {
    /// Landing slots are applied to the landing configuration, not the draft.
    #[must_use]
    pub fn is_landing(self) -> bool {
        matches!(self, ImageSlot::Hero | ImageSlot::AdBanner)
    }
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSlot::Logo => f.write_str("logo"),
            ImageSlot::Gallery(i) => write!(f, "gallery{i}"),
            ImageSlot::Hero => f.write_str("hero"),
            ImageSlot::AdBanner => f.write_str("ad"),
        }
    }
}

impl std::str::FromStr for ImageSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "logo" => Ok(ImageSlot::Logo),
            "hero" => Ok(ImageSlot::Hero),
            "ad" | "adbanner" | "banner" => Ok(ImageSlot::AdBanner),
            other => other
                .strip_prefix("gallery")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&i| i < GALLERY_SLOTS)
                .map(ImageSlot::Gallery)
                .ok_or_else(|| format!("unknown image slot '{s}'")),
        }
    }
}

/// Editable form state. Numeric fields are loose here and coerced on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerDraft {
    pub name: String,
    pub sector: Sector,
    pub category: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub office_phone: String,
    pub whatsapp: String,
    pub email: String,
    pub website: String,
    pub services: Vec<String>,
    pub gallery: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub rating: f64,
    pub reliability: i64,
    pub status: PartnerStatus,
    pub logo: String,
    pub is_premium: bool,
    pub industrial_capacity: String,
    pub view_count: Option<i64>,
    pub lead_count: Option<i64>,
}

impl Default for PartnerDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            sector: Sector::Industrial,
            category: String::new(),
            description: String::new(),
            address: String::new(),
            city: DEFAULT_CITY.to_string(),
            office_phone: String::new(),
            whatsapp: String::new(),
            email: String::new(),
            website: String::new(),
            services: Vec::new(),
            gallery: Vec::new(),
            x: DEFAULT_LAT,
            y: DEFAULT_LNG,
            rating: 5.0,
            reliability: 100,
            status: PartnerStatus::Active,
            logo: String::new(),
            is_premium: false,
            industrial_capacity: String::new(),
            view_count: None,
            lead_count: None,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl PartnerDraft {
    #[must_use]
    pub fn from_business(b: &Business) -> Self {
        Self {
            name: b.name.clone(),
            sector: b.sector,
            category: b.category.clone(),
            description: b.description.clone(),
            address: b.address.clone(),
            city: b.city.clone(),
            office_phone: b.office_phone.clone(),
            whatsapp: b.whatsapp.clone().unwrap_or_default(),
            email: b.email.clone().unwrap_or_default(),
            website: b.website.clone().unwrap_or_default(),
            services: b.services.clone(),
            gallery: b.gallery.clone(),
            x: b.x,
            y: b.y,
            rating: b.rating,
            reliability: i64::from(b.reliability),
            status: b.status,
            logo: b.logo.clone(),
            is_premium: b.is_premium,
            industrial_capacity: b.industrial_capacity.clone().unwrap_or_default(),
            view_count: b.view_count,
            lead_count: b.lead_count,
        }
    }

    /// Writes an uploaded URL into a draft slot. Gallery slots pad with
    /// empty strings up to the index; indices past [`GALLERY_SLOTS`] and
    /// landing slots are ignored.
    pub fn set_image(&mut self, slot: ImageSlot, url: String) {
        match slot {
            ImageSlot::Logo => self.logo = url,
            ImageSlot::Gallery(i) if i >= GALLERY_SLOTS => {
                tracing::warn!(slot = i, "gallery slot out of range; upload dropped");
            }
            ImageSlot::Gallery(i) => {
                if self.gallery.len() <= i {
                    self.gallery.resize(i + 1, String::new());
                }
                self.gallery[i] = url;
            }
            ImageSlot::Hero | ImageSlot::AdBanner => {}
        }
    }

    /// Builds the record to persist under `id`.
    ///
    /// Rating falls back to 5.0 when unset or non-finite and is clamped to
    /// 1.0-5.0; reliability falls back to 100 when zero and is clamped to
    /// 0-100. Services and empty gallery entries are trimmed away.
    #[must_use]
    pub fn to_business(&self, id: String) -> Business {
        let rating = if self.rating.is_finite() && self.rating > 0.0 {
            self.rating.clamp(1.0, 5.0)
        } else {
            5.0
        };
        let reliability = match self.reliability {
            0 => 100,
            r => u8::try_from(r.clamp(0, 100)).unwrap_or(100),
        };

        Business {
            id,
            name: self.name.trim().to_string(),
            sector: self.sector,
            category: self.category.trim().to_string(),
            description: self.description.clone(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            office_phone: self.office_phone.trim().to_string(),
            whatsapp: non_empty(&self.whatsapp),
            email: non_empty(&self.email),
            website: non_empty(&self.website),
            services: self.services.iter().filter_map(|s| non_empty(s)).collect(),
            gallery: self.gallery.iter().filter_map(|s| non_empty(s)).collect(),
            x: self.x,
            y: self.y,
            rating,
            reliability,
            status: self.status,
            logo: self.logo.trim().to_string(),
            is_premium: self.is_premium,
            industrial_capacity: non_empty(&self.industrial_capacity),
            view_count: self.view_count,
            lead_count: self.lead_count,
        }
    }
}

/// What a successful submit asks the store to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    Insert(Business),
    Update { id: String, partner: Business },
}

/// An unlocked admin surface: at most one open draft plus in-flight I/O counters.
#[derive(Debug, Default)]
pub struct AdminSession {
    draft: Option<PartnerDraft>,
    editing_id: Option<String>,
    location_input: String,
    uploads_in_flight: usize,
    next_lookup: u64,
    /// Token of the only lookup whose answer may still reach the draft.
    pending_lookup: Option<u64>,
}

impl AdminSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_create(&mut self) {
        self.draft = Some(PartnerDraft::default());
        self.editing_id = None;
        self.location_input.clear();
        self.pending_lookup = None;
    }

    pub fn begin_edit(&mut self, partner: &Business) {
        self.draft = Some(PartnerDraft::from_business(partner));
        self.editing_id = Some(partner.id.clone());
        self.location_input.clone_from(&partner.address);
        self.pending_lookup = None;
    }

    pub fn cancel(&mut self) {
        self.draft = None;
        self.editing_id = None;
        self.location_input.clear();
        self.pending_lookup = None;
    }

    #[must_use]
    pub fn draft(&self) -> Option<&PartnerDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut PartnerDraft> {
        self.draft.as_mut()
    }

    #[must_use]
    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    #[must_use]
    pub fn location_input(&self) -> &str {
        &self.location_input
    }

    /// `true` while an upload or a location lookup is outstanding.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.uploads_in_flight > 0 || self.pending_lookup.is_some()
    }

    pub fn upload_started(&mut self) {
        self.uploads_in_flight += 1;
    }

    pub fn upload_finished(&mut self) {
        self.uploads_in_flight = self.uploads_in_flight.saturating_sub(1);
    }

    /// Starts a lookup for `input` and returns its token together with the
    /// query to resolve: `"<input>, <draft city>"`. A newer lookup, or
    /// switching drafts, supersedes any earlier token.
    ///
    /// # Errors
    ///
    /// [`AdminError::NoDraft`] without an open draft, or
    /// [`AdminError::EmptyLocation`] for blank input.
    pub fn begin_resolve(&mut self, input: &str) -> Result<(u64, String), AdminError> {
        let draft = self.draft.as_ref().ok_or(AdminError::NoDraft)?;
        let input = input.trim();
        if input.is_empty() {
            return Err(AdminError::EmptyLocation);
        }
        let query = format!("{input}, {}", draft.city);
        self.location_input = input.to_string();
        self.next_lookup += 1;
        self.pending_lookup = Some(self.next_lookup);
        Ok((self.next_lookup, query))
    }

    /// Applies a resolved coordinate. Returns `false` when `token` was
    /// superseded or the draft is gone.
    pub fn finish_resolve(&mut self, token: u64, input: &str, lat: f64, lng: f64) -> bool {
        if self.pending_lookup != Some(token) {
            return false;
        }
        self.pending_lookup = None;
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        draft.x = lat;
        draft.y = lng;
        draft.address = input.to_string();
        true
    }

    /// Validates the draft and closes it.
    ///
    /// # Errors
    ///
    /// [`AdminError::NoDraft`], [`AdminError::Busy`] while uploads or a
    /// lookup are in flight, or [`AdminError::Invalid`]. The draft stays
    /// open on error.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<SubmitAction, AdminError> {
        let draft = self.draft.as_ref().ok_or(AdminError::NoDraft)?;
        if self.busy() {
            return Err(AdminError::Busy);
        }
        let id = self
            .editing_id
            .clone()
            .unwrap_or_else(|| generate_partner_id(now));
        let partner = draft.to_business(id);
        partner.validate()?;

        let action = match self.editing_id.take() {
            Some(id) => SubmitAction::Update { id, partner },
            None => SubmitAction::Insert(partner),
        };
        self.draft = None;
        self.location_input.clear();
        Ok(action)
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
