//! Emulator handle - the control surface's view of a running emulator

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use sp0256_core::{
    DeviceState, Sp0256Error, Sp0256Result, StatusSnapshot, Waveform, TARGET_SYSTEM,
};
use sp0256_store::WaveformStore;
use sp0256_time::{Clock, MonotonicClock};
use tokio::sync::{mpsc, oneshot};

use crate::{
    simulated_hardware, spawn_realtime, BusPins, Diagnostics, EmulatorConfig, Hardware,
    IsolationStatus, PwmLog, PwmOutput, Request, SimBus,
};

/// A started emulator
///
/// Constructed once at startup; everything the control surface does goes
/// through here.
pub struct EmulatorHandle {
    config: EmulatorConfig,
    store: Arc<WaveformStore>,
    state: Arc<DeviceState>,
    requests: mpsc::Sender<Request>,
    isolation: IsolationStatus,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Handle plus the host side of simulated hardware
pub struct SimulatedEmulator {
    pub handle: EmulatorHandle,
    pub bus: SimBus,
    pub pwm: Arc<PwmLog>,
}

impl EmulatorHandle {
    /// Seed the pinned pauses, start the real-time thread and wait for it
    ///
    /// Hardware init failure and startup timeout are both fatal.
    pub async fn start<P, W, C, F>(
        config: EmulatorConfig,
        store: WaveformStore,
        clock: C,
        init: F,
    ) -> Sp0256Result<Self>
    where
        P: BusPins + 'static,
        W: PwmOutput + 'static,
        C: Clock + 'static,
        F: FnOnce() -> Sp0256Result<Hardware<P, W>> + Send + 'static,
    {
        let store = Arc::new(store);
        let state = Arc::new(DeviceState::new());
        store.preload_pinned();

        let (tx, rx) = mpsc::channel(config.request_capacity.max(1));
        let (thread, ready) =
            spawn_realtime(&config, clock, store.clone(), state.clone(), rx, init)?;

        let isolation = match tokio::time::timeout(config.startup_timeout, ready).await {
            Ok(Ok(Ok(isolation))) => isolation,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(_)) => {
                return Err(Sp0256Error::HardwareInit(
                    "real-time thread exited before signalling".into(),
                ))
            }
            Err(_) => {
                tracing::error!(
                    target: TARGET_SYSTEM,
                    timeout = ?config.startup_timeout,
                    "real-time context did not start"
                );
                return Err(Sp0256Error::StartupTimeout(config.startup_timeout));
            }
        };

        tracing::info!(
            target: TARGET_SYSTEM,
            source = %store.active_source(),
            cached = store.cache_len(),
            isolated = isolation.is_isolated(),
            "emulator started"
        );

        Ok(EmulatorHandle {
            config,
            store,
            state,
            requests: tx,
            isolation,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Start on simulated pins with the wall clock
    pub async fn start_simulated(
        config: EmulatorConfig,
        store: WaveformStore,
        capture: bool,
    ) -> Sp0256Result<SimulatedEmulator> {
        let (bus, hardware, pwm) = simulated_hardware(capture);
        let handle = Self::start(config, store, MonotonicClock::new(), move || Ok(hardware)).await?;
        Ok(SimulatedEmulator { handle, bus, pwm })
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(
            self.state.counters(),
            self.store.cache_len(),
            self.store.active_source(),
        )
    }

    /// Waveform lookup; InvalidId leaves the cache untouched
    pub fn get(&self, raw: u32) -> Sp0256Result<Waveform> {
        self.store.get(raw)
    }

    pub fn evict_nonessential(&self) -> usize {
        self.store.evict_nonessential()
    }

    /// Clear the cache and re-seed the pauses; returns the new cache size
    pub fn reset(&self) -> usize {
        self.store.reset();
        self.store.cache_len()
    }

    /// Queue a sequence on the real-time thread and wait for it to finish
    ///
    /// Returns `(played, total)`; out-of-range ids are skipped.
    pub async fn play_sequence(&self, ids: Vec<u32>) -> Sp0256Result<(usize, usize)> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(Request::Speak { ids, reply })
            .await
            .map_err(|_| Sp0256Error::RealtimeStopped)?;
        answer.await.map_err(|_| Sp0256Error::RealtimeStopped)
    }

    pub async fn diagnostics(&self) -> Sp0256Result<Diagnostics> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(Request::Diagnostics { reply })
            .await
            .map_err(|_| Sp0256Error::RealtimeStopped)?;
        answer.await.map_err(|_| Sp0256Error::RealtimeStopped)
    }

    /// Stop the real-time thread after its current playback
    pub async fn shutdown(&self) -> Sp0256Result<()> {
        let _ = self.requests.send(Request::Shutdown).await;
        let thread = self.thread.lock().take();
        if let Some(thread) = thread {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|_| Sp0256Error::RealtimeStopped)?
                .map_err(|_| Sp0256Error::RealtimeStopped)?;
        }
        tracing::info!(target: TARGET_SYSTEM, plays = self.state.play_count(), "emulator stopped");
        Ok(())
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<WaveformStore> {
        &self.store
    }

    pub fn state(&self) -> &Arc<DeviceState> {
        &self.state
    }

    pub fn isolation(&self) -> IsolationStatus {
        self.isolation
    }
}
