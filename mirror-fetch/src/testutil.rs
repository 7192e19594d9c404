//! Hand-rolled test doubles, in the teacher's style of writing small
//! in-memory fakes rather than reaching for a mocking framework.
//! Exposed outside `#[cfg(test)]` behind the `test-util` feature so
//! `mirror-node`'s integration tests can drive the full pipeline
//! against them too.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mirror_types::{
    GlobalImageId, ImageId, MirrorImage, MirrorImageState, MirrorMode, PromotionState,
    RemoteMirrorUuid,
};

use crate::io::{ClientRecord, IoContext, IoError, Journaler, JournalerFactory, MetadataPage};

#[derive(Debug, Clone)]
struct LocalImageRecord {
    global_id: GlobalImageId,
    name: String,
    mirror: MirrorImage,
}

struct Inner {
    by_global: HashMap<GlobalImageId, ImageId>,
    images: HashMap<ImageId, LocalImageRecord>,
    tag_owners: HashMap<ImageId, String>,
    mirror_uuid: RemoteMirrorUuid,
    is_primary_on_open: HashMap<ImageId, bool>,
    open_images: HashMap<ImageId, u64>,
    snapshot_limits: HashMap<ImageId, u64>,
    user_metadata: HashMap<ImageId, Vec<(String, Vec<u8>)>>,
    written_states: HashMap<(ImageId, u64), Vec<u8>>,
    promotion: HashMap<ImageId, PromotionState>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            by_global: HashMap::new(),
            images: HashMap::new(),
            tag_owners: HashMap::new(),
            mirror_uuid: RemoteMirrorUuid::new(""),
            is_primary_on_open: HashMap::new(),
            open_images: HashMap::new(),
            snapshot_limits: HashMap::new(),
            user_metadata: HashMap::new(),
            written_states: HashMap::new(),
            promotion: HashMap::new(),
        }
    }
}

/// A single in-memory stand-in for the object-store RPC client,
/// usable as either the local or the remote `IoContext` — real
/// deployments always pass two distinct instances, one per cluster.
#[derive(Default, Clone)]
pub struct FakeIoContext {
    inner: Arc<Mutex<Inner>>,
    next_handle: Arc<AtomicU64>,
}

impl FakeIoContext {
    pub fn add_local_image(
        &mut self,
        global_id: GlobalImageId,
        image_id: ImageId,
        name: &str,
        mode: MirrorMode,
        state: MirrorImageState,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_global.insert(global_id.clone(), image_id.clone());
        inner.images.insert(
            image_id,
            LocalImageRecord {
                global_id,
                name: name.to_string(),
                mirror: MirrorImage {
                    mode,
                    state,
                    global_image_id: GlobalImageId::new(""),
                },
            },
        );
    }

    pub fn add_remote_image(&mut self, global_id: GlobalImageId, image_id: ImageId, mode: MirrorMode) {
        self.add_local_image(global_id, image_id, "remote-image", mode, MirrorImageState::Enabled);
    }

    pub fn set_tag_owner(&mut self, image_id: ImageId, owner: &str) {
        self.inner.lock().unwrap().tag_owners.insert(image_id, owner.to_string());
    }

    pub fn set_remote_uuid(&mut self, uuid: &str) {
        self.inner.lock().unwrap().mirror_uuid = RemoteMirrorUuid::new(uuid);
    }

    pub fn mark_primary_on_open(&mut self, image_id: ImageId) {
        self.inner.lock().unwrap().is_primary_on_open.insert(image_id, true);
    }

    pub fn set_snapshot_limit(&mut self, image_id: ImageId, limit: u64) {
        self.inner.lock().unwrap().snapshot_limits.insert(image_id, limit);
    }

    pub fn set_user_metadata(&mut self, image_id: ImageId, entries: Vec<(String, Vec<u8>)>) {
        self.inner.lock().unwrap().user_metadata.insert(image_id, entries);
    }

    pub fn written_state(&self, image_id: &ImageId, snapshot_id: u64) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .written_states
            .get(&(image_id.clone(), snapshot_id))
            .cloned()
    }

    pub fn is_open(&self, image_id: &ImageId) -> bool {
        self.inner.lock().unwrap().open_images.contains_key(image_id)
    }

    pub fn set_promotion(&mut self, image_id: ImageId, state: PromotionState) {
        self.inner.lock().unwrap().promotion.insert(image_id, state);
    }
}

impl IoContext for FakeIoContext {
    fn dir_get_name(&self, image_id: &ImageId) -> Result<String, IoError> {
        let inner = self.inner.lock().unwrap();
        inner
            .images
            .get(image_id)
            .map(|r| r.name.clone())
            .ok_or_else(|| IoError::NotFound(format!("image {image_id}")))
    }

    fn mirror_image_get(&self, image_id: &ImageId) -> Result<MirrorImage, IoError> {
        let inner = self.inner.lock().unwrap();
        inner
            .images
            .get(image_id)
            .map(|r| MirrorImage {
                mode: r.mirror.mode,
                state: r.mirror.state,
                global_image_id: r.global_id.clone(),
            })
            .ok_or_else(|| IoError::NotFound(format!("mirror image {image_id}")))
    }

    fn mirror_uuid_get(&self) -> Result<RemoteMirrorUuid, IoError> {
        Ok(self.inner.lock().unwrap().mirror_uuid.clone())
    }

    fn mirror_image_get_image_id(&self, global_id: &GlobalImageId) -> Result<ImageId, IoError> {
        let inner = self.inner.lock().unwrap();
        inner
            .by_global
            .get(global_id)
            .cloned()
            .ok_or_else(|| IoError::NotFound(format!("global image {global_id}")))
    }

    fn promotion_state(&self, image_id: &ImageId) -> Result<PromotionState, IoError> {
        let inner = self.inner.lock().unwrap();
        if !inner.images.contains_key(image_id) {
            return Err(IoError::NotFound(format!("image {image_id}")));
        }
        Ok(inner.promotion.get(image_id).copied().unwrap_or(PromotionState::Primary))
    }

    fn get_tag_owner(&self, image_id: &ImageId) -> Result<String, IoError> {
        let inner = self.inner.lock().unwrap();
        inner
            .tag_owners
            .get(image_id)
            .cloned()
            .ok_or_else(|| IoError::NotFound(format!("tag owner for {image_id}")))
    }

    fn image_open(&self, image_id: &ImageId) -> Result<crate::io::ImageHandle, IoError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.images.contains_key(image_id) {
            return Err(IoError::NotFound(format!("image {image_id}")));
        }
        if inner.is_primary_on_open.get(image_id).copied().unwrap_or(false) {
            return Err(IoError::IsPrimary);
        }
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        inner.open_images.insert(image_id.clone(), handle);
        Ok(crate::io::ImageHandle(handle))
    }

    fn image_close(&self, handle: crate::io::ImageHandle) -> Result<(), IoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.open_images.retain(|_, h| *h != handle.0);
        Ok(())
    }

    fn image_create(
        &self,
        global_id: &GlobalImageId,
        _remote_image: &crate::io::ImageHandle,
    ) -> Result<ImageId, IoError> {
        let mut inner = self.inner.lock().unwrap();
        let image_id = ImageId::new(format!("created-{}", global_id));
        inner.by_global.insert(global_id.clone(), image_id.clone());
        inner.images.insert(
            image_id.clone(),
            LocalImageRecord {
                global_id: global_id.clone(),
                name: "created-image".into(),
                mirror: MirrorImage {
                    mode: MirrorMode::Journal,
                    state: MirrorImageState::Enabled,
                    global_image_id: global_id.clone(),
                },
            },
        );
        Ok(image_id)
    }

    fn snapshot_limit(&self, image_id: &ImageId) -> Result<u64, IoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .snapshot_limits
            .get(image_id)
            .copied()
            .unwrap_or(u64::MAX))
    }

    fn list_user_metadata(
        &self,
        image_id: &ImageId,
        start_after: Option<&str>,
    ) -> Result<MetadataPage, IoError> {
        let inner = self.inner.lock().unwrap();
        let all = inner.user_metadata.get(image_id).cloned().unwrap_or_default();
        let start_idx = match start_after {
            None => 0,
            Some(key) => all.iter().position(|(k, _)| k == key).map(|i| i + 1).unwrap_or(all.len()),
        };
        const PAGE_SIZE: usize = 2;
        let page: Vec<_> = all[start_idx..].iter().take(PAGE_SIZE).cloned().collect();
        let next = if start_idx + page.len() < all.len() {
            page.last().map(|(k, _)| k.clone())
        } else {
            None
        };
        Ok(MetadataPage {
            entries: page,
            next_start_after: next,
        })
    }

    fn write_image_state(
        &self,
        image_id: &ImageId,
        snapshot_id: u64,
        data: &[u8],
    ) -> Result<(), IoError> {
        self.inner
            .lock()
            .unwrap()
            .written_states
            .insert((image_id.clone(), snapshot_id), data.to_vec());
        Ok(())
    }
}

/// A single in-memory remote journal, shared across every `Journaler`
/// handle a `FakeJournalerFactory` constructs, so a test can register
/// a client once and observe it again on a later `construct` call.
#[derive(Default, Clone)]
pub struct FakeJournalerFactory {
    clients: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_construct: Arc<Mutex<bool>>,
}

impl FakeJournalerFactory {
    pub fn fail_next_construct(&self) {
        *self.fail_construct.lock().unwrap() = true;
    }

    pub fn preregister(&self, client_id: &str, data: Vec<u8>) {
        self.clients.lock().unwrap().insert(client_id.to_string(), data);
    }
}

impl JournalerFactory for FakeJournalerFactory {
    fn construct(
        &self,
        _image_id: &ImageId,
        _commit_interval: f64,
    ) -> Result<Box<dyn Journaler>, IoError> {
        let mut fail = self.fail_construct.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(IoError::NotFound("journaler unavailable".into()));
        }
        Ok(Box::new(FakeJournaler {
            clients: self.clients.clone(),
        }))
    }
}

struct FakeJournaler {
    clients: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Journaler for FakeJournaler {
    fn get_client(
        &self,
        client_id: &mirror_types::LocalMirrorUuid,
    ) -> Result<ClientRecord, crate::io::JournalError> {
        self.clients
            .lock()
            .unwrap()
            .get(client_id.as_str())
            .cloned()
            .map(|data| ClientRecord { data })
            .ok_or(crate::io::JournalError::NotFound)
    }

    fn register_client(
        &self,
        client_id: &mirror_types::LocalMirrorUuid,
        data: &[u8],
    ) -> Result<(), crate::io::JournalError> {
        self.clients
            .lock()
            .unwrap()
            .insert(client_id.as_str().to_string(), data.to_vec());
        Ok(())
    }
}
