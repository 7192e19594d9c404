//! `BootstrapRequest`: the coordinator driving the nine-stage pipeline
//! from `mirror-fetch` to completion. Replaces the source's
//! heap-allocated self-owning callback chain with a tagged `Stage` enum
//! advanced one step at a time, each step posted onto the worker
//! queue rather than called recursively, per the re-architecture notes
//! for "callback continuations" and "pointer-to-pointer output
//! parameters".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mirror_fetch::{
    close_remote, error::Error, get_mirror_info, image_sync::ImageSyncFactory, open_local,
    open_remote, prepare_local, prepare_remote, prepare_replay, IoContext, JournalerFactory,
    StateBuilder,
};
use mirror_types::{GlobalImageId, LocalMirrorUuid};

use crate::cancel::CancelToken;
use crate::config::BootstrapConfig;
use crate::worker::Queue;

/// Delivered to the completion callback exactly once (invariant P1).
pub struct BootstrapOutcome {
    /// `0` on success, a negative [`Error::status_code`] otherwise.
    pub status: i32,
    /// Non-`None` iff `status == 0`, per the coordinator's contract.
    pub state: Option<StateBuilder>,
    /// Set when `PrepareReplay` observed an operator-requested resync.
    pub do_resync: bool,
}

type Completion = Box<dyn FnOnce(BootstrapOutcome) + Send>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stage {
    PrepareLocal,
    PrepareRemote,
    CheckLocalPrimary,
    OpenRemote,
    GetMirrorInfo,
    OpenLocal,
    PrepareReplay,
}

pub struct BootstrapRequest {
    local_ctx: Arc<dyn IoContext>,
    remote_ctx: Arc<dyn IoContext>,
    journaler_factory: Arc<dyn JournalerFactory>,
    image_sync_factory: Arc<dyn ImageSyncFactory>,
    global_id: GlobalImageId,
    local_mirror_uuid: LocalMirrorUuid,
    config: BootstrapConfig,
    queue: Queue,
    cancel: CancelToken,
    builder: Mutex<Option<StateBuilder>>,
    do_resync: AtomicBool,
    on_finish: Mutex<Option<Completion>>,
}

impl BootstrapRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local_ctx: Arc<dyn IoContext>,
        remote_ctx: Arc<dyn IoContext>,
        journaler_factory: Arc<dyn JournalerFactory>,
        image_sync_factory: Arc<dyn ImageSyncFactory>,
        global_id: GlobalImageId,
        local_mirror_uuid: LocalMirrorUuid,
        config: BootstrapConfig,
        queue: Queue,
        on_finish: Completion,
    ) -> Arc<Self> {
        Arc::new(Self {
            local_ctx,
            remote_ctx,
            journaler_factory,
            image_sync_factory,
            global_id,
            local_mirror_uuid,
            config,
            queue,
            cancel: CancelToken::new(),
            builder: Mutex::new(None),
            do_resync: AtomicBool::new(false),
            on_finish: Mutex::new(Some(on_finish)),
        })
    }

    /// Sets the cancellation flag. Safe from any thread, at any time;
    /// idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Starts the pipeline. Posts the first stage onto the worker
    /// queue rather than running it inline, so the caller's thread
    /// never blocks on this call.
    pub fn send(self: &Arc<Self>) {
        self.post(Stage::PrepareLocal);
    }

    fn post(self: &Arc<Self>, stage: Stage) {
        let this = Arc::clone(self);
        self.queue.post(Box::new(move || this.step(stage)));
    }

    fn step(self: Arc<Self>, stage: Stage) {
        if self.cancel.is_cancelled() {
            self.unwind(Error::Cancelled.status_code());
            return;
        }

        let result = match stage {
            Stage::PrepareLocal => self.do_prepare_local(),
            Stage::PrepareRemote => self.do_prepare_remote(),
            Stage::CheckLocalPrimary => {
                if self.is_local_primary() {
                    self.finish(0);
                    return;
                }
                Ok(())
            }
            Stage::OpenRemote => self.do_open_remote(),
            Stage::GetMirrorInfo => self.do_get_mirror_info(),
            Stage::OpenLocal => self.do_open_local(),
            Stage::PrepareReplay => {
                self.do_prepare_replay();
                return;
            }
        };

        match result {
            Ok(()) => self.post(next_stage(stage)),
            Err(e) => self.unwind(e.status_code()),
        }
    }

    fn is_local_primary(&self) -> bool {
        self.builder
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|b| b.is_local_primary(self.local_mirror_uuid.as_str()))
    }

    fn do_prepare_local(&self) -> Result<(), Error> {
        let mut slot = self.builder.lock().unwrap().take();
        let result = prepare_local::prepare_local_image(self.local_ctx.as_ref(), &self.global_id, &mut slot);
        *self.builder.lock().unwrap() = slot;
        result
    }

    fn do_prepare_remote(&self) -> Result<(), Error> {
        let mut slot = self.builder.lock().unwrap().take();
        let result = prepare_remote::prepare_remote_image(
            self.remote_ctx.as_ref(),
            self.journaler_factory.as_ref(),
            &self.global_id,
            &self.local_mirror_uuid,
            self.config.journal_commit_age,
            &mut slot,
        );
        *self.builder.lock().unwrap() = slot;
        result
    }

    fn do_open_remote(&self) -> Result<(), Error> {
        let mut guard = self.builder.lock().unwrap();
        let builder = guard.as_mut().expect("builder populated by prepare-remote");
        open_remote::open_remote_image(self.remote_ctx.as_ref(), builder)
    }

    fn do_get_mirror_info(&self) -> Result<(), Error> {
        let guard = self.builder.lock().unwrap();
        let builder = guard.as_ref().expect("builder populated by prepare-remote");
        get_mirror_info::get_remote_mirror_info(self.remote_ctx.as_ref(), builder)
    }

    fn do_open_local(&self) -> Result<(), Error> {
        let mut guard = self.builder.lock().unwrap();
        let builder = guard.as_mut().expect("builder populated by prepare-remote");
        open_local::open_local_image(self.local_ctx.as_ref(), &self.global_id, builder)
    }

    /// `PrepareReplay` is the one stage that can transition into an
    /// asynchronous sub-request (`ImageSync`), so — unlike the other
    /// stages — it drives its own continuation instead of falling
    /// through the generic `Ok`/`Err` dispatch in `step`.
    fn do_prepare_replay(self: Arc<Self>) {
        let outcome = {
            let guard = self.builder.lock().unwrap();
            let builder = guard.as_ref().expect("builder populated by prepare-remote");
            prepare_replay::prepare_replay(builder)
        };

        match outcome {
            Err(e) => self.unwind(e.status_code()),
            Ok(outcome) if outcome.resync => {
                self.do_resync.store(true, Ordering::SeqCst);
                self.unwind(0);
            }
            Ok(outcome) if outcome.syncing => self.run_image_sync(),
            Ok(_) => self.unwind(0),
        }
    }

    fn run_image_sync(self: Arc<Self>) {
        let sync = {
            let guard = self.builder.lock().unwrap();
            let builder = guard.as_ref().expect("builder populated by prepare-remote");
            self.image_sync_factory.construct(builder)
        };

        let this = Arc::clone(&self);
        let cancel_token = self.cancel.as_atomic();
        sync.send(
            cancel_token,
            Box::new(move |result| {
                let status = match result {
                    Ok(()) => 0,
                    Err(e) => e.status_code(),
                };
                // Re-enter through the queue: the sync subrequest may
                // complete on its own thread, and `unwind` must not run
                // while holding whatever lock that thread still has.
                this.post_unwind(status);
            }),
        );
    }

    fn post_unwind(self: Arc<Self>, status: i32) {
        let queue = self.queue.clone();
        queue.post(Box::new(move || self.unwind(status)));
    }

    /// Always attempts `CloseRemoteImage` (a no-op if nothing was
    /// opened) before delivering `status`. Close failures are logged
    /// inside `close_remote_image` and never change `status`.
    fn unwind(self: Arc<Self>, status: i32) {
        {
            let mut guard = self.builder.lock().unwrap();
            if let Some(builder) = guard.as_mut() {
                close_remote::close_remote_image(self.remote_ctx.as_ref(), builder);
            }
        }
        self.finish(status);
    }

    fn finish(self: Arc<Self>, status: i32) {
        let state = if status == 0 {
            self.builder.lock().unwrap().take()
        } else {
            if let Some(mut builder) = self.builder.lock().unwrap().take() {
                builder.destroy();
            }
            None
        };
        let do_resync = self.do_resync.load(Ordering::SeqCst);

        let callback = self.on_finish.lock().unwrap().take();
        match callback {
            Some(cb) => cb(BootstrapOutcome { status, state, do_resync }),
            None => log::error!(target: "bootstrap", "completion callback fired more than once"),
        }
    }
}

fn next_stage(stage: Stage) -> Stage {
    match stage {
        Stage::PrepareLocal => Stage::PrepareRemote,
        Stage::PrepareRemote => Stage::CheckLocalPrimary,
        Stage::CheckLocalPrimary => Stage::OpenRemote,
        Stage::OpenRemote => Stage::GetMirrorInfo,
        Stage::GetMirrorInfo => Stage::OpenLocal,
        Stage::OpenLocal => Stage::PrepareReplay,
        Stage::PrepareReplay => unreachable!("PrepareReplay drives its own continuation"),
    }
}
