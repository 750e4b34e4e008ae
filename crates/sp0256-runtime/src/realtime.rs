//! The real-time polling thread

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use sp0256_core::{DeviceState, Sp0256Error, Sp0256Result, TARGET_INTERFACE, TARGET_SYSTEM};
use sp0256_store::WaveformStore;
use sp0256_time::Clock;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use crate::{
    isolate_current_thread, BusPins, BusProtocol, Diagnostics, EmulatorConfig, Hardware,
    IsolationStatus, PlaybackEngine, PwmOutput,
};

/// Work the control surface hands to the real-time thread
#[derive(Debug)]
pub enum Request {
    /// Play raw ids; replies `(played, total)`
    Speak {
        ids: Vec<u32>,
        reply: oneshot::Sender<(usize, usize)>,
    },
    Diagnostics {
        reply: oneshot::Sender<Diagnostics>,
    },
    Shutdown,
}

/// Startup outcome sent back to the spawner
pub type ReadySignal = oneshot::Receiver<Sp0256Result<IsolationStatus>>;

/// Loop body: poll, drain requests while ready, yield
pub struct RealtimeLoop<P, W, C> {
    bus: BusProtocol<P, W, C>,
    requests: mpsc::Receiver<Request>,
    poll_interval: Duration,
}

impl<P: BusPins, W: PwmOutput, C: Clock> RealtimeLoop<P, W, C> {
    pub fn new(
        bus: BusProtocol<P, W, C>,
        requests: mpsc::Receiver<Request>,
        poll_interval: Duration,
    ) -> Self {
        RealtimeLoop {
            bus,
            requests,
            poll_interval,
        }
    }

    /// Run until shutdown or until every sender is gone
    pub fn run(mut self) {
        tracing::info!(target: TARGET_SYSTEM, "interface monitoring started");
        while self.step() {
            if self.poll_interval.is_zero() {
                std::thread::yield_now();
            } else {
                std::thread::sleep(self.poll_interval);
            }
        }
        tracing::info!(target: TARGET_SYSTEM, "interface monitoring stopped");
    }

    /// One poll plus a non-blocking drain; false once the loop should stop
    pub fn step(&mut self) -> bool {
        self.bus.poll();
        loop {
            match self.requests.try_recv() {
                Ok(request) => {
                    if !self.handle(request) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Speak { ids, reply } => {
                tracing::debug!(target: TARGET_INTERFACE, count = ids.len(), "speak request");
                let result = self.bus.play_sequence(&ids);
                let _ = reply.send(result);
                true
            }
            Request::Diagnostics { reply } => {
                let _ = reply.send(self.bus.diagnostics());
                true
            }
            Request::Shutdown => false,
        }
    }

    pub fn bus(&self) -> &BusProtocol<P, W, C> {
        &self.bus
    }
}

/// Spawn the real-time thread
///
/// `init` runs on the new thread. Its error, or a PWM configure error, is
/// sent back as the ready signal and the thread exits.
pub fn spawn_realtime<P, W, C, F>(
    config: &EmulatorConfig,
    clock: C,
    store: Arc<WaveformStore>,
    state: Arc<DeviceState>,
    requests: mpsc::Receiver<Request>,
    init: F,
) -> Sp0256Result<(JoinHandle<()>, ReadySignal)>
where
    P: BusPins + 'static,
    W: PwmOutput + 'static,
    C: Clock + 'static,
    F: FnOnce() -> Sp0256Result<Hardware<P, W>> + Send + 'static,
{
    let (ready_tx, ready_rx) = oneshot::channel();
    let config = config.clone();

    let thread = std::thread::Builder::new()
        .name("sp0256-rt".into())
        .spawn(move || {
            let isolation = if config.realtime_isolation {
                isolate_current_thread(config.realtime_priority, config.realtime_cpu)
            } else {
                IsolationStatus::default()
            };

            let hardware = match init().and_then(|mut hw| {
                hw.pwm.configure(config.pwm_frequency_hz)?;
                Ok(hw)
            }) {
                Ok(hw) => hw,
                Err(e) => {
                    tracing::error!(target: TARGET_SYSTEM, "hardware init failed: {}", e);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let engine = PlaybackEngine::new(clock);
            let bus = BusProtocol::new(hardware, engine, config.debounce_us(), store, state)
                .with_isolation(isolation);

            if ready_tx.send(Ok(isolation)).is_err() {
                tracing::warn!(target: TARGET_SYSTEM, "startup abandoned by control surface");
                return;
            }
            RealtimeLoop::new(bus, requests, config.poll_interval).run();
        })
        .map_err(|e| Sp0256Error::HardwareInit(format!("spawn real-time thread: {}", e)))?;

    Ok((thread, ready_rx))
}
