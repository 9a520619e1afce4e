//! Facility rooms (bathroom / breakroom)
//!
//! A facility is a capacity-bounded room plus the fixed access pipeline every
//! admitted request goes through. Bathroom and breakroom differ only in
//! their parameters, so there is a single type configured per instance
//! rather than one subtype per room.

use crate::facility::protocol::{EventToken, FacilityKind, Push};
use crate::types::{AgentId, AgentState};
use crate::zones::BufferZone;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Channel used to push protocol lines back to one connected agent.
pub type PushSender = mpsc::UnboundedSender<Push>;

/// How one attended request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendOutcome {
    /// Full pipeline ran; BREAK_COMPLETE was emitted
    Completed,
    /// Aborted by cancellation or shutdown; INTERRUPTED was emitted
    Interrupted,
}

/// One admission-controlled facility room.
#[derive(Debug)]
pub struct Facility {
    kind: FacilityKind,
    room: BufferZone,
    dwell: Duration,
    walk: Duration,
}

impl Facility {
    /// Create a facility with the given room capacity, dwell time, and
    /// walk-in/walk-out time.
    pub fn new(kind: FacilityKind, capacity: usize, dwell: Duration, walk: Duration) -> Self {
        let room = BufferZone::new(format!("{} room", kind), capacity);
        Self { kind, room, dwell, walk }
    }

    /// Which facility this is.
    pub fn kind(&self) -> FacilityKind {
        self.kind
    }

    /// The admission gate guarding the room, for occupancy monitoring.
    pub fn room(&self) -> &BufferZone {
        &self.room
    }

    /// Close the room gate, unblocking queued requests for shutdown.
    pub fn close(&self) {
        self.room.close();
    }

    /// Run the access pipeline for one admitted request.
    ///
    /// The caller has already serialized requests per agent; this method
    /// handles queuing on the room gate, the enter/use/exit phases, and the
    /// completion event. The room slot is released on every exit path: the
    /// gate guard travels on the stack, so cancellation or a dropped
    /// connection cannot leak it.
    pub async fn attend(
        &self,
        agent: &AgentId,
        channel: &PushSender,
        cancel: &CancellationToken,
    ) -> AttendOutcome {
        // Queued: the agent waits outside until the room has a free slot.
        self.push_state(agent, channel, AgentState::Waiting);

        let guard = tokio::select! {
            _ = cancel.cancelled() => return self.interrupt(agent, channel),
            entered = self.room.enter() => match entered {
                Ok(guard) => guard,
                Err(_) => return self.interrupt(agent, channel),
            },
        };
        debug!(agent = %agent, facility = %self.kind, occupancy = self.room.occupancy(), "admitted");

        // Entering: ownership of the agent's state and location is ours from
        // here until the exit pushes land.
        let _ = channel.send(Push::Location { agent: agent.clone(), location: self.kind.location() });
        self.push_state(agent, channel, AgentState::Moving);
        if !self.pause(self.walk, cancel).await {
            return self.interrupt(agent, channel);
        }

        // In use.
        self.push_state(agent, channel, AgentState::OnBreak);
        if !self.pause(self.dwell, cancel).await {
            return self.interrupt(agent, channel);
        }

        // Exiting: walk out, then hand the agent back to its origin zone.
        self.push_state(agent, channel, AgentState::Moving);
        if !self.pause(self.walk, cancel).await {
            return self.interrupt(agent, channel);
        }

        self.push_state(agent, channel, AgentState::Idle);
        let _ = channel.send(Push::Location { agent: agent.clone(), location: agent.origin_zone() });
        let _ = channel
            .send(Push::Event { agent: agent.clone(), token: EventToken::BreakComplete });
        info!(agent = %agent, facility = %self.kind, "visit complete");

        guard.leave();
        AttendOutcome::Completed
    }

    /// Sleep for `duration` unless cancelled first. Returns whether the
    /// pipeline should proceed.
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }

    fn interrupt(&self, agent: &AgentId, channel: &PushSender) -> AttendOutcome {
        info!(agent = %agent, facility = %self.kind, "visit interrupted");
        let _ = channel.send(Push::Event { agent: agent.clone(), token: EventToken::Interrupted });
        AttendOutcome::Interrupted
    }

    fn push_state(&self, agent: &AgentId, channel: &PushSender, state: AgentState) {
        let _ = channel.send(Push::State { agent: agent.clone(), state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentKind;
    use crate::types::AgentLocation;

    fn quick_facility(capacity: usize) -> Facility {
        Facility::new(
            FacilityKind::Bathroom,
            capacity,
            Duration::from_millis(10),
            Duration::from_millis(2),
        )
    }

    #[tokio::test]
    async fn test_attend_pushes_full_sequence() {
        let facility = quick_facility(1);
        let agent = AgentId::new(AgentKind::Worker, 0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let outcome = facility.attend(&agent, &tx, &cancel).await;
        assert_eq!(outcome, AttendOutcome::Completed);
        drop(tx);

        let mut pushes = Vec::new();
        while let Some(push) = rx.recv().await {
            pushes.push(push);
        }
        assert_eq!(
            pushes,
            vec![
                Push::State { agent: agent.clone(), state: AgentState::Waiting },
                Push::Location { agent: agent.clone(), location: AgentLocation::Bathroom },
                Push::State { agent: agent.clone(), state: AgentState::Moving },
                Push::State { agent: agent.clone(), state: AgentState::OnBreak },
                Push::State { agent: agent.clone(), state: AgentState::Moving },
                Push::State { agent: agent.clone(), state: AgentState::Idle },
                Push::Location { agent: agent.clone(), location: AgentLocation::Factory },
                Push::Event { agent: agent.clone(), token: EventToken::BreakComplete },
            ]
        );
        // The room slot was given back.
        assert_eq!(facility.room().occupancy(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_use_releases_slot_and_interrupts() {
        let facility = std::sync::Arc::new(Facility::new(
            FacilityKind::Breakroom,
            1,
            Duration::from_secs(60),
            Duration::from_millis(1),
        ));
        let agent = AgentId::new(AgentKind::Delivery, 1);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = {
            let facility = std::sync::Arc::clone(&facility);
            let agent = agent.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { facility.attend(&agent, &tx, &cancel).await })
        };

        // Let the request reach the in-use phase, then abort it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert_eq!(task.await.unwrap(), AttendOutcome::Interrupted);
        assert_eq!(facility.room().occupancy(), 0);

        let mut saw_interrupted = false;
        while let Ok(push) = rx.try_recv() {
            if matches!(push, Push::Event { token: EventToken::Interrupted, .. }) {
                saw_interrupted = true;
            }
        }
        assert!(saw_interrupted);
    }

    #[tokio::test]
    async fn test_delivery_agent_returns_to_loading_deck() {
        let facility = quick_facility(1);
        let agent = AgentId::new(AgentKind::Delivery, 0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        facility.attend(&agent, &tx, &cancel).await;
        drop(tx);

        let mut final_location = None;
        while let Some(push) = rx.recv().await {
            if let Push::Location { location, .. } = push {
                final_location = Some(location);
            }
        }
        assert_eq!(final_location, Some(AgentLocation::LoadingDeck));
    }
}
