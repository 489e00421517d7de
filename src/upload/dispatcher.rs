use super::client::DeviceClient;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Fire-and-forget request runner with a single in-flight slot.
///
/// A job submitted while another is running is dropped, never queued.
#[derive(Clone)]
pub struct Dispatcher {
    client: DeviceClient,
    busy: Arc<AtomicBool>,
    started: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

/// Releases the in-flight slot even if the job panics
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(client: DeviceClient) -> Self {
        Self {
            client,
            busy: Arc::new(AtomicBool::new(false)),
            started: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn client(&self) -> &DeviceClient {
        &self.client
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run `job` on a worker thread; returns false when a job is already in flight
    pub fn try_dispatch<F>(&self, label: &'static str, job: F) -> bool
    where
        F: FnOnce(&DeviceClient) -> Result<()> + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::trace!("{label}: request in flight, skipped");
            return false;
        }
        self.started.fetch_add(1, Ordering::Relaxed);

        let guard = SlotGuard(Arc::clone(&self.busy));
        let client = self.client.clone();
        let failed = Arc::clone(&self.failed);
        let spawned = thread::Builder::new()
            .name(format!("upload-{label}"))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = job(&client) {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log::debug!("{label} failed: {e:#}");
                }
            });
        if let Err(e) = spawned {
            // the closure and its guard were dropped, so the slot is free again
            log::warn!("could not start {label} worker: {e}");
            return false;
        }
        true
    }

    /// Jobs accepted so far
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Jobs that returned an error
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Block until the in-flight job finishes or `timeout` passes
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{DeviceLink, Multipart};
    use anyhow::bail;
    use std::sync::mpsc;
    use std::sync::Mutex;

    /// Blocks every request until the test releases it
    struct GatedLink {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl DeviceLink for GatedLink {
        fn post_multipart(&self, _path: &str, _form: Multipart, _t: Option<Duration>) -> Result<String> {
            let gate = self.gate.lock().unwrap();
            gate.recv().ok();
            Ok(String::new())
        }

        fn post_form(&self, _path: &str, _fields: &[(&str, &str)]) -> Result<String> {
            bail!("unreachable")
        }

        fn get(&self, _path: &str, _query: &[(&str, &str)]) -> Result<String> {
            bail!("offline")
        }
    }

    fn gated() -> (Dispatcher, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let link = GatedLink { gate: Mutex::new(rx) };
        (Dispatcher::new(DeviceClient::new(Arc::new(link))), tx)
    }

    #[test]
    fn busy_dispatcher_skips_new_work() {
        let (dispatcher, release) = gated();
        assert!(dispatcher.try_dispatch("first", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
        assert!(dispatcher.is_busy());
        assert!(!dispatcher.try_dispatch("second", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
        assert_eq!(dispatcher.started(), 1);

        release.send(()).unwrap();
        assert!(dispatcher.wait_idle(Duration::from_secs(2)));
        assert!(dispatcher.try_dispatch("third", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
        release.send(()).unwrap();
        assert!(dispatcher.wait_idle(Duration::from_secs(2)));
        assert_eq!(dispatcher.started(), 2);
    }

    #[test]
    fn failures_are_counted_not_raised() {
        let (dispatcher, _release) = gated();
        assert!(dispatcher.try_dispatch("poll", |c| c.theme_status().map(|_| ())));
        assert!(dispatcher.wait_idle(Duration::from_secs(2)));
        assert_eq!(dispatcher.failed(), 1);
    }

    #[test]
    fn panicking_job_frees_the_slot() {
        let (dispatcher, _release) = gated();
        assert!(dispatcher.try_dispatch("boom", |_| panic!("job blew up")));
        assert!(dispatcher.wait_idle(Duration::from_secs(2)));
        assert!(!dispatcher.is_busy());
    }
}
