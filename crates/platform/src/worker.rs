use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

use ticketing_events::Subscription;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        self.wait();
    }

    /// Wait for the worker to stop on its own (subscription ended).
    pub fn join(mut self) {
        self.wait();
    }

    fn wait(&mut self) {
        if let Some(j) = self.join.take() {
            if j.join().is_err() {
                warn!(worker = self.name, "event worker thread panicked");
            }
        }
    }
}

/// Background consumer of a bus subscription.
///
/// - Applies the handler to each event in delivery order
/// - Logs handler failures and keeps going
/// - Stops on shutdown request, or when the subscription ends (bus closed)
#[derive(Debug)]
pub struct EventWorker;

impl EventWorker {
    pub fn spawn<M, H>(
        name: &'static str,
        subscription: Subscription<M>,
        mut handler: H,
    ) -> anyhow::Result<WorkerHandle>
    where
        M: Send + 'static,
        H: FnMut(M) -> anyhow::Result<()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, subscription, shutdown_rx, &mut handler))
            .with_context(|| format!("failed to spawn event worker thread {name}"))?;

        Ok(WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H>(
    name: &'static str,
    subscription: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) where
    H: FnMut(M) -> anyhow::Result<()>,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match subscription.recv_timeout(tick) {
            Ok(event) => {
                if let Err(err) = handler(event) {
                    warn!(worker = name, error = %format!("{err:#}"), "event worker handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker = name, "event worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use ticketing_events::{EventBus, InMemoryEventBus};

    #[test]
    fn processes_events_until_bus_closes() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let worker = EventWorker::spawn("test-worker", bus.subscribe(), move |e: u32| {
            sink.lock().unwrap().push(e);
            Ok(())
        })
        .unwrap();

        bus.publish(1);
        bus.publish(2);
        bus.close();
        worker.join();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn handler_errors_do_not_stop_the_worker() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let worker = EventWorker::spawn("flaky-worker", bus.subscribe(), move |e: u32| {
            sink.lock().unwrap().push(e);
            if e == 1 {
                anyhow::bail!("first event rejected");
            }
            Ok(())
        })
        .unwrap();

        bus.publish(1);
        bus.publish(2);
        bus.close();
        worker.join();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn shutdown_stops_an_idle_worker() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let worker = EventWorker::spawn("idle-worker", bus.subscribe(), |_| Ok(())).unwrap();
        assert_eq!(worker.name(), "idle-worker");
        worker.shutdown();
        assert!(!bus.is_closed());
    }
}
