//! Hub engine
//!
//! This module contains the control loop that owns the membership set:
//! - admitting handles from the register queue
//! - removing and closing handles from the unregister queue
//! - fanning each broadcast payload out to every current member
//! - counting housekeeping ticks on a fixed interval
//!
//! Concurrency and usage notes:
//! - `Hub::run` is the only code that touches the membership set or calls
//!   `send`/`close` on a handle. Producers hold a `HubHandle` and only push
//!   into channels, so there is no lock around the set.
//! - Each loop iteration takes at most one item from each queue, in the
//!   order register, unregister, broadcast. A backlog in one queue never
//!   holds back the others by more than one item. The loop only parks when
//!   all three are empty.
//! - A fan-out sends to all members concurrently and bounds every send with
//!   the configured timeout. A failed or timed out send evicts the member.
//!   The ticker keeps being polled while sends are pending, so the gap
//!   between ticks stays at the interval however slow a member is.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::client::{ClientHandle, ClientId, Connection, SendError};
use crate::config::HubSettings;
use crate::hub::membership::Membership;
use crate::hub::metrics::{HubMetrics, HubStats};
use crate::hub::payload::Payload;
use crate::utils::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Running,
    Stopped,
}

#[derive(Debug, Error)]
enum DeliveryFailure {
    #[error("send failed: {0}")]
    Send(#[from] SendError),

    #[error("send timed out after {0:?}")]
    TimedOut(Duration),
}

/// The hub's control side. Owns the membership set and the receiving end of
/// every queue; drive it with [`Hub::run`] on a dedicated task.
pub struct Hub<C> {
    members: Membership<C>,
    register_rx: mpsc::UnboundedReceiver<ClientHandle<C>>,
    unregister_rx: mpsc::UnboundedReceiver<ClientHandle<C>>,
    broadcast_rx: mpsc::Receiver<Payload>,
    shutdown_rx: watch::Receiver<bool>,
    metrics: Arc<HubMetrics>,
    tick_interval: Duration,
    send_timeout: Duration,
    state: HubState,
}

/// The producer side of a hub. Cheap to clone; every method is safe to call
/// from any task and none waits for the hub to process the request.
pub struct HubHandle<C> {
    register_tx: mpsc::UnboundedSender<ClientHandle<C>>,
    unregister_tx: mpsc::UnboundedSender<ClientHandle<C>>,
    broadcast_tx: mpsc::Sender<Payload>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    metrics: Arc<HubMetrics>,
    tick_interval: Duration,
}

impl<C: Connection> Hub<C> {
    /// Creates a hub and the handle producers use to reach it.
    ///
    /// The register and unregister queues are unbounded. The broadcast queue
    /// holds at most `broadcast_queue_capacity` payloads.
    pub fn new(settings: &HubSettings) -> (Self, HubHandle<C>) {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(settings.queue_capacity());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = HubMetrics::new();
        let tick_interval = settings.tick_interval();

        let hub = Self {
            members: Membership::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
            shutdown_rx,
            metrics: Arc::clone(&metrics),
            tick_interval,
            send_timeout: settings.send_timeout(),
            state: HubState::Running,
        };

        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
            shutdown_tx: Arc::new(shutdown_tx),
            metrics,
            tick_interval,
        };

        (hub, handle)
    }

    pub fn state(&self) -> HubState {
        self.state
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Runs the control loop until shutdown is signalled or every
    /// `HubHandle` has been dropped, then stops the hub for good.
    pub async fn run(&mut self) {
        if self.state == HubState::Stopped {
            return;
        }

        self.metrics.mark_started();
        info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            send_timeout_ms = self.send_timeout.as_millis() as u64,
            "hub running"
        );

        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            if self.shutdown_requested() {
                break;
            }

            while ticker.tick().now_or_never().is_some() {
                self.housekeeping();
            }

            let mut handled = false;
            if let Ok(handle) = self.register_rx.try_recv() {
                self.admit(handle);
                handled = true;
            }
            if let Ok(handle) = self.unregister_rx.try_recv() {
                self.remove(handle);
                handled = true;
            }
            if let Ok(payload) = self.broadcast_rx.try_recv() {
                self.fan_out(payload, &mut ticker).await;
                handled = true;
            }

            if handled {
                tokio::task::yield_now().await;
                continue;
            }

            // every queue is empty: park until something arrives
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        debug!("all hub handles dropped");
                        break;
                    }
                }
                _ = ticker.tick() => self.housekeeping(),
                Some(handle) = self.register_rx.recv() => self.admit(handle),
                Some(handle) = self.unregister_rx.recv() => self.remove(handle),
                Some(payload) = self.broadcast_rx.recv() => self.fan_out(payload, &mut ticker).await,
            }
        }

        self.stop();
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow() || self.shutdown_rx.has_changed().is_err()
    }

    fn housekeeping(&self) {
        self.metrics.tick();
        self.metrics.set_members(self.members.len());
        trace!(
            ticks = self.metrics.ticks(),
            members = self.members.len(),
            "hub tick"
        );
    }

    fn admit(&mut self, handle: ClientHandle<C>) {
        let id = handle.id().clone();
        if self.members.insert(handle) {
            self.metrics.inc_registrations();
            self.metrics.set_members(self.members.len());
            debug!(client_id = %id, members = self.members.len(), "client registered");
        } else {
            debug!(client_id = %id, "client already registered");
        }
    }

    fn remove(&mut self, handle: ClientHandle<C>) {
        match self.members.remove(handle.id()) {
            Some(member) => {
                member.close();
                self.metrics.inc_unregistrations();
                self.metrics.set_members(self.members.len());
                debug!(client_id = %member.id(), members = self.members.len(), "client unregistered");
            }
            None => trace!(client_id = %handle.id(), "unregister for non-member ignored"),
        }
    }

    /// Sends `payload` to every member and evicts the ones that fail.
    ///
    /// The queues are not read until every send has finished or timed out,
    /// but housekeeping ticks still fire on schedule. A shutdown signal
    /// abandons the sends still pending.
    async fn fan_out(&mut self, payload: Payload, ticker: &mut Interval) {
        self.metrics.inc_broadcasts();

        if self.members.is_empty() {
            trace!(bytes = payload.len(), "broadcast with no members");
            return;
        }

        let send_timeout = self.send_timeout;
        let outcomes = {
            let attempts = self.members.iter().map(|member| {
                let payload = payload.clone();
                async move {
                    let outcome = match time::timeout(send_timeout, member.send(payload)).await {
                        Ok(result) => result.map_err(DeliveryFailure::from),
                        Err(_) => Err(DeliveryFailure::TimedOut(send_timeout)),
                    };
                    (member.id().clone(), outcome)
                }
            });
            let sends = join_all(attempts);
            tokio::pin!(sends);

            loop {
                tokio::select! {
                    biased;

                    _ = self.shutdown_rx.changed() => {
                        debug!("shutdown during broadcast, pending sends abandoned");
                        return;
                    }
                    _ = ticker.tick() => self.housekeeping(),
                    outcomes = &mut sends => break outcomes,
                }
            }
        };

        let mut delivered = 0u64;
        let mut failed = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => delivered += 1,
                Err(reason) => failed.push((id, reason)),
            }
        }

        self.metrics.add_deliveries(delivered);
        trace!(delivered, failed = failed.len(), "broadcast delivered");

        for (id, reason) in failed {
            self.evict(&id, reason);
        }
    }

    fn evict(&mut self, id: &ClientId, reason: DeliveryFailure) {
        if let Some(member) = self.members.remove(id) {
            member.close();
            self.metrics.add_evictions(1);
            self.metrics.set_members(self.members.len());
            warn!(client_id = %id, error = %reason, "evicted client after failed delivery");
        }
    }

    /// Closes the queues, settles whatever is still in them without sending
    /// anything, and closes every member exactly once.
    fn stop(&mut self) {
        self.register_rx.close();
        self.unregister_rx.close();
        self.broadcast_rx.close();

        // pending registrations join the set only so they are closed below
        while let Ok(handle) = self.register_rx.try_recv() {
            self.members.insert(handle);
        }
        while let Ok(handle) = self.unregister_rx.try_recv() {
            self.remove(handle);
        }

        let mut discarded = 0u64;
        while self.broadcast_rx.try_recv().is_ok() {
            discarded += 1;
        }

        let mut closed = 0usize;
        for member in self.members.drain() {
            member.close();
            closed += 1;
        }

        self.metrics.add_discarded(discarded);
        self.metrics.set_members(0);
        self.metrics.mark_stopped();
        self.state = HubState::Stopped;

        info!(closed, discarded, "hub stopped");
    }
}

impl<C> HubHandle<C> {
    /// Enqueues a handle for admission.
    ///
    /// Fails with [`HubError::Stopped`] once the hub has stopped; the handle
    /// was not taken and the caller must close it.
    pub fn submit_register(&self, handle: ClientHandle<C>) -> Result<(), HubError> {
        self.register_tx.send(handle).map_err(|_| HubError::Stopped)
    }

    /// Enqueues a handle for removal. Removing a non-member is a no-op.
    ///
    /// After shutdown the request is dropped silently: stopping the hub has
    /// already closed every member.
    pub fn submit_unregister(&self, handle: ClientHandle<C>) {
        let _ = self.unregister_tx.send(handle);
    }

    /// Enqueues a payload without waiting.
    ///
    /// When the broadcast queue is full the payload is rejected with
    /// [`HubError::BroadcastQueueFull`] and counted as dropped.
    pub fn submit_broadcast(&self, payload: impl Into<Payload>) -> Result<(), HubError> {
        match self.broadcast_tx.try_send(payload.into()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.metrics.inc_dropped();
                Err(HubError::BroadcastQueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(HubError::Stopped),
        }
    }

    /// Enqueues a payload, waiting for room in the broadcast queue.
    pub async fn broadcast(&self, payload: impl Into<Payload>) -> Result<(), HubError> {
        self.broadcast_tx
            .send(payload.into())
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Signals the hub to stop. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// A receiver that flips to `true` when shutdown is signalled.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.metrics.is_running()
    }

    /// Housekeeping ticks counted since the hub started.
    pub fn ticks(&self) -> u64 {
        self.metrics.ticks()
    }

    pub fn stats(&self) -> HubStats {
        self.metrics.snapshot(self.tick_interval)
    }
}

impl<C> Clone for HubHandle<C> {
    fn clone(&self) -> Self {
        Self {
            register_tx: self.register_tx.clone(),
            unregister_tx: self.unregister_tx.clone(),
            broadcast_tx: self.broadcast_tx.clone(),
            shutdown_tx: Arc::clone(&self.shutdown_tx),
            metrics: Arc::clone(&self.metrics),
            tick_interval: self.tick_interval,
        }
    }
}
