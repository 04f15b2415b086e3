//! Partner directory controller: filter, selection and map sync, toasts,
//! the admin unlock gate and edit session, and the runtime that drives
//! them against the record store, object store and geocoder.

pub mod adapters;
pub mod admin;
pub mod cache;
pub mod camera;
pub mod debounce;
pub mod error;
pub mod gate;
pub mod ports;
pub mod runtime;
pub mod state;
pub mod toast;

pub use adapters::{NoUploader, PgStore};
pub use admin::{AdminSession, ImageSlot, PartnerDraft, SubmitAction};
pub use cache::LocalCache;
pub use camera::{camera_command, recenter_command, CameraCommand, MapFrame, MapSync, Marker};
pub use debounce::{Debounced, SEARCH_DEBOUNCE};
pub use error::{AdminError, CacheError, SelectionError};
pub use gate::{PasscodeOutcome, UnlockGate, GATE_TAPS, GATE_WINDOW};
pub use ports::{ImageUploader, LocationResolver, PartnerStore, StoreError, UploadError};
pub use runtime::{spawn, Command, DraftEdit, RuntimeClosed, RuntimeConfig, RuntimeHandle};
pub use state::{Completion, DirectoryState, Effect, MutationKind, Tab, ViewUpdate};
pub use toast::{Toast, ToastId, ToastKind, ToastQueue, TOAST_TTL};
