//! A small worker pool that runs boxed continuations off a shared job
//! queue. Grounded on the teacher's `Worker`/`Pool` split: a fixed
//! number of threads pull from one `crossbeam_channel::Receiver`, and
//! any continuation that would otherwise recurse on the current stack
//! (a stage finishing and immediately starting the next one) is instead
//! posted back onto this queue.

use std::thread;

use crossbeam_channel as chan;

/// A unit of work: an opaque closure run on whichever worker thread
/// picks it up next. Stage functions never see this type directly —
/// `BootstrapRequest` is the only thing that posts jobs.
pub type Job = Box<dyn FnOnce() + Send>;

/// Handle used to post continuations onto the pool's queue.
#[derive(Clone)]
pub struct Queue {
    sender: chan::Sender<Job>,
}

impl Queue {
    pub fn post(&self, job: Job) {
        if self.sender.send(job).is_err() {
            log::error!(target: "bootstrap::worker", "posted a job after the worker pool shut down");
        }
    }
}

/// A pool of worker threads draining a shared job queue. Dropping the
/// pool's `Queue` handles and joining stops every thread once the
/// channel is drained and disconnected.
pub struct Pool {
    threads: Vec<thread::JoinHandle<()>>,
    queue: Queue,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = chan::unbounded::<Job>();
        let mut threads = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let receiver = receiver.clone();
            let thread = thread::Builder::new()
                .name(format!("bootstrap-worker-{i}"))
                .spawn(move || run(receiver))
                .expect("failed to spawn worker thread");
            threads.push(thread);
        }
        Self {
            threads,
            queue: Queue { sender },
        }
    }

    pub fn queue(&self) -> Queue {
        self.queue.clone()
    }

    /// Drops the pool's own sender so workers exit once every
    /// outstanding `Queue` clone is also dropped, then joins them.
    pub fn join(self) {
        drop(self.queue);
        for thread in self.threads {
            if thread.join().is_err() {
                log::error!(target: "bootstrap::worker", "worker thread panicked");
            }
        }
    }
}

fn run(receiver: chan::Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        job();
    }
    log::debug!(target: "bootstrap::worker", "worker exiting, queue disconnected");
}
