//! Runtime tests against in-memory ports with a paused clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radar_app::{
    spawn, Command, ImageSlot, ImageUploader, LocalCache, LocationResolver, PartnerStore,
    RuntimeConfig, RuntimeHandle, StoreError, ToastKind, UploadError, ViewUpdate,
};
use radar_core::{Business, Coordinates, LandingConfig, PartnerStatus, Sector};
use radar_storage::ImageFile;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

#[derive(Default)]
struct Inner {
    partners: Vec<Business>,
    settings: HashMap<String, LandingConfig>,
    fail_mutations: bool,
    first_list_delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    list_calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    fn with_partners(partners: Vec<Business>) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().partners = partners;
        store
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.inner.lock().unwrap().fail_mutations {
            Err(StoreError("permission denied for table businesses".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PartnerStore for MemoryStore {
    async fn list_partners(&self) -> Result<Vec<Business>, StoreError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (mut partners, delay) = {
            let inner = self.inner.lock().unwrap();
            (inner.partners.clone(), inner.first_list_delay)
        };
        if let (0, Some(delay)) = (call, delay) {
            tokio::time::sleep(delay).await;
        }
        partners.sort_by_key(|b| !b.is_premium);
        Ok(partners)
    }

    async fn get_landing(&self, key: &str) -> Result<Option<LandingConfig>, StoreError> {
        Ok(self.inner.lock().unwrap().settings.get(key).cloned())
    }

    async fn insert_partner(&self, partner: &Business) -> Result<(), StoreError> {
        self.check()?;
        self.inner.lock().unwrap().partners.push(partner.clone());
        Ok(())
    }

    async fn update_partner(&self, id: &str, partner: &Business) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .partners
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError(format!("record not found: {id}")))?;
        *slot = partner.clone();
        Ok(())
    }

    async fn delete_partner(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.lock().unwrap().partners.retain(|b| b.id != id);
        Ok(())
    }

    async fn upsert_landing(&self, key: &str, config: &LandingConfig) -> Result<(), StoreError> {
        self.check()?;
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), config.clone());
        Ok(())
    }
}

struct FailingUploader;

impl ImageUploader for FailingUploader {
    async fn upload_image(&self, _file: ImageFile) -> Result<String, UploadError> {
        Err(UploadError("upload rejected with HTTP 413: too large".to_string()))
    }
}

struct FixedResolver(Coordinates);

impl LocationResolver for FixedResolver {
    async fn resolve_location(&self, _query: &str) -> Coordinates {
        self.0
    }
}

fn partner(id: &str, name: &str, sector: Sector, premium: bool) -> Business {
    Business {
        id: id.to_string(),
        name: name.to_string(),
        sector,
        category: String::new(),
        description: String::new(),
        address: String::new(),
        city: "San Luis Potosí".to_string(),
        office_phone: String::new(),
        whatsapp: None,
        email: None,
        website: None,
        services: vec![],
        gallery: vec![],
        x: 22.15,
        y: -100.98,
        rating: 5.0,
        reliability: 100,
        status: PartnerStatus::Active,
        logo: format!("https://example.com/{id}.png"),
        is_premium: premium,
        industrial_capacity: None,
        view_count: None,
        lead_count: None,
    }
}

struct Harness {
    handle: RuntimeHandle,
    updates: UnboundedReceiver<ViewUpdate>,
    task: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
    cache: LocalCache,
}

fn start(store: MemoryStore) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let cache = LocalCache::new(dir.path(), "radar_config");
    start_with_cache(store, dir, cache)
}

fn start_with_cache(store: MemoryStore, dir: tempfile::TempDir, cache: LocalCache) -> Harness {
    let (handle, updates, task) = spawn(
        RuntimeConfig {
            passcode: "2003".to_string(),
            landing_key: "landing_config".to_string(),
            cache: cache.clone(),
        },
        store,
        FailingUploader,
        FixedResolver(Coordinates::new(22.1498, -100.9761)),
    );
    Harness {
        handle,
        updates,
        task,
        _dir: dir,
        cache,
    }
}

/// Waits for the first update matching `pred`, skipping others.
async fn wait_for<F>(rx: &mut UnboundedReceiver<ViewUpdate>, mut pred: F) -> ViewUpdate
where
    F: FnMut(&ViewUpdate) -> bool,
{
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let update = rx.recv().await.expect("runtime closed");
            if pred(&update) {
                return update;
            }
        }
    })
    .await
    .expect("expected update did not arrive")
}

fn visible_ids(update: &ViewUpdate) -> Option<Vec<String>> {
    match update {
        ViewUpdate::Visible(list) => Some(list.iter().map(|b| b.id.clone()).collect()),
        _ => None,
    }
}

fn has_toast(update: &ViewUpdate, message: &str, kind: ToastKind) -> bool {
    matches!(update, ViewUpdate::Toasts(t) if t.iter().any(|t| t.message == message && t.kind == kind))
}

async fn unlock(h: &mut Harness) {
    for _ in 0..5 {
        h.handle.send(Command::TapLogo).await.unwrap();
    }
    wait_for(&mut h.updates, |u| *u == ViewUpdate::PromptShown).await;
    h.handle
        .send(Command::Passcode("2003".to_string()))
        .await
        .unwrap();
    wait_for(&mut h.updates, |u| *u == ViewUpdate::AdminUnlocked).await;
}

#[tokio::test(start_paused = true)]
async fn startup_lists_premium_first() {
    let store = MemoryStore::with_partners(vec![
        partner("A", "Foo", Sector::Industrial, false),
        partner("B", "Bar", Sector::Health, true),
    ]);
    let mut h = start(store);

    let update = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Visible(_))).await;
    assert_eq!(visible_ids(&update).unwrap(), ["B", "A"]);
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
}

#[tokio::test(start_paused = true)]
async fn cached_landing_is_shown_then_replaced_by_store() {
    let store = MemoryStore::default();
    let remote = LandingConfig {
        hero_image: "https://cdn.example.com/remote-hero.jpg".to_string(),
        ad_banner_image: "https://cdn.example.com/remote-ad.jpg".to_string(),
    };
    store
        .inner
        .lock()
        .unwrap()
        .settings
        .insert("landing_config".to_string(), remote.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = LocalCache::new(dir.path(), "radar_config");
    let cached = LandingConfig {
        hero_image: "https://cdn.example.com/cached-hero.jpg".to_string(),
        ad_banner_image: "https://cdn.example.com/cached-ad.jpg".to_string(),
    };
    cache.store(&cached).unwrap();

    let mut h = start_with_cache(store, dir, cache);
    let first = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Landing(_))).await;
    assert_eq!(first, ViewUpdate::Landing(cached));
    let second = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Landing(_))).await;
    assert_eq!(second, ViewUpdate::Landing(remote.clone()));

    // Effects are dispatched before updates are forwarded.
    assert_eq!(h.cache.load().unwrap(), Some(remote));
}

#[tokio::test(start_paused = true)]
async fn search_is_debounced_through_the_runtime() {
    let store = MemoryStore::with_partners(vec![
        partner("A", "Foo", Sector::Industrial, false),
        partner("B", "Bar", Sector::Health, false),
    ]);
    let mut h = start(store);
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;

    for text in ["b", "ba", "bar"] {
        h.handle
            .send(Command::Search(text.to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let last_keystroke = Instant::now() - Duration::from_millis(100);

    let update = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Visible(_))).await;
    assert_eq!(visible_ids(&update).unwrap(), ["B"]);
    assert!(Instant::now() - last_keystroke >= Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn insert_refetches_and_shows_new_partner() {
    let store = MemoryStore::with_partners(vec![partner("A", "Foo", Sector::Industrial, false)]);
    let mut h = start(store.clone());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    unlock(&mut h).await;

    h.handle.send(Command::BeginCreate).await.unwrap();
    h.handle
        .send(Command::EditDraft(Box::new(|d| {
            d.name = "Nueva Planta".to_string();
            d.logo = "https://example.com/np.png".to_string();
        })))
        .await
        .unwrap();
    h.handle.send(Command::SubmitPartner).await.unwrap();

    wait_for(&mut h.updates, |u| {
        has_toast(u, "Partner saved", ToastKind::Success)
    })
    .await;
    let update = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Visible(_))).await;
    assert_eq!(visible_ids(&update).unwrap().len(), 2);
    assert_eq!(store.inner.lock().unwrap().partners.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_startup_fetch_does_not_hide_a_fresh_insert() {
    let store = MemoryStore::with_partners(vec![partner("A", "Foo", Sector::Industrial, false)]);
    store.inner.lock().unwrap().first_list_delay = Some(Duration::from_secs(30));
    let mut h = start(store.clone());
    unlock(&mut h).await;

    h.handle.send(Command::BeginCreate).await.unwrap();
    h.handle
        .send(Command::EditDraft(Box::new(|d| {
            d.name = "Nueva Planta".to_string();
            d.logo = "https://example.com/np.png".to_string();
        })))
        .await
        .unwrap();
    h.handle.send(Command::SubmitPartner).await.unwrap();
    wait_for(&mut h.updates, |u| {
        visible_ids(u).is_some_and(|ids| ids.len() == 2)
    })
    .await;

    // The startup snapshot, taken before the insert, lands now.
    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    while let Ok(update) = h.updates.try_recv() {
        if let Some(ids) = visible_ids(&update) {
            assert_eq!(ids.len(), 2, "stale snapshot was applied: {ids:?}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failed_mutation_toasts_and_refetches() {
    let store = MemoryStore::with_partners(vec![partner("A", "Foo", Sector::Industrial, false)]);
    store.inner.lock().unwrap().fail_mutations = true;
    let mut h = start(store.clone());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    unlock(&mut h).await;
    let calls_before = store.list_calls.load(Ordering::SeqCst);

    h.handle
        .send(Command::DeletePartner("A".to_string()))
        .await
        .unwrap();
    wait_for(&mut h.updates, |u| {
        has_toast(
            u,
            "Store error: permission denied for table businesses",
            ToastKind::Error,
        )
    })
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(store.list_calls.load(Ordering::SeqCst), calls_before + 1);
    assert_eq!(store.inner.lock().unwrap().partners.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_submission_is_rejected_without_store_call() {
    let store = MemoryStore::default();
    let mut h = start(store.clone());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    unlock(&mut h).await;

    h.handle.send(Command::BeginCreate).await.unwrap();
    h.handle.send(Command::SubmitPartner).await.unwrap();
    let update = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Rejected(_))).await;
    assert_eq!(
        update,
        ViewUpdate::Rejected("partner name must be non-empty".to_string())
    );
    assert!(store.inner.lock().unwrap().partners.is_empty());
}

#[tokio::test(start_paused = true)]
async fn upload_failure_raises_alert() {
    let mut h = start(MemoryStore::default());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    unlock(&mut h).await;

    h.handle.send(Command::BeginCreate).await.unwrap();
    h.handle
        .send(Command::UploadImage {
            slot: ImageSlot::Logo,
            file: ImageFile::new("big.png", vec![0; 16]),
        })
        .await
        .unwrap();
    let update = wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Alert(_))).await;
    assert_eq!(
        update,
        ViewUpdate::Alert("Upload failed: upload rejected with HTTP 413: too large".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn resolved_location_updates_draft() {
    let mut h = start(MemoryStore::default());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    unlock(&mut h).await;

    h.handle.send(Command::BeginCreate).await.unwrap();
    h.handle
        .send(Command::ResolveLocation("Lanzagorta 330".to_string()))
        .await
        .unwrap();
    let update = wait_for(&mut h.updates, |u| {
        matches!(u, ViewUpdate::Draft(Some(d)) if d.address == "Lanzagorta 330")
    })
    .await;
    let ViewUpdate::Draft(Some(draft)) = update else {
        unreachable!()
    };
    assert!((draft.x - 22.1498).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn toasts_expire_after_four_seconds() {
    let mut h = start(MemoryStore::default());
    wait_for(&mut h.updates, |u| *u == ViewUpdate::Loading(false)).await;
    for _ in 0..5 {
        h.handle.send(Command::TapLogo).await.unwrap();
    }
    h.handle
        .send(Command::Passcode("9999".to_string()))
        .await
        .unwrap();
    wait_for(&mut h.updates, |u| has_toast(u, "Wrong code", ToastKind::Error)).await;
    let shown = Instant::now();

    wait_for(&mut h.updates, |u| matches!(u, ViewUpdate::Toasts(t) if t.is_empty())).await;
    let elapsed = Instant::now() - shown;
    assert!(elapsed >= Duration::from_millis(4000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(4100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_runtime() {
    let h = start(MemoryStore::default());
    let Harness { handle, task, .. } = h;
    drop(handle);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("runtime should stop")
        .expect("runtime task should not panic");
}
