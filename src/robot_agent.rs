use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// The robot service lifecycle events this application consumes. The vendor
/// listener surface is far wider; backends narrow it down to these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotEvent {
    ServiceStarted,
    ServiceStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Initializing,
    Ready,
    NotReady,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Initializing => f.write_str("initializing"),
            Readiness::Ready => f.write_str("ready"),
            Readiness::NotReady => f.write_str("not ready"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("robot service unavailable: {0}")]
    Unavailable(String),
    #[error("motor {0} rejected command: {1}")]
    Rejected(i32, String),
}

/// Actuation seam in front of the vendor robot SDK.
pub trait RobotAgent: Send + Sync {
    fn control_motor(&self, motor_code: i32, angle: f32, speed: i32) -> Result<(), AgentError>;
    fn start_tts(&self, text: &str) -> Result<(), AgentError>;
    fn release(&self);
}

/// Owns the agent reference and its readiness state. Readiness is written by
/// a single adapter task translating [`RobotEvent`]s; everyone else observes
/// it through the watch channel.
pub struct AgentHandle {
    agent: Option<Arc<dyn RobotAgent>>,
    readiness: watch::Receiver<Readiness>,
}

impl AgentHandle {
    /// Simulation mode: no hardware behind the seam, readiness forced to
    /// Ready immediately, actuation skipped by the dispatcher.
    pub fn simulated() -> Self {
        let (_tx, rx) = watch::channel(Readiness::Ready);
        Self {
            agent: None,
            readiness: rx,
        }
    }

    /// Hardware mode: readiness follows the service lifecycle events.
    pub fn hardware(agent: Arc<dyn RobotAgent>, mut events: mpsc::Receiver<RobotEvent>) -> Self {
        let (tx, rx) = watch::channel(Readiness::Initializing);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let next = match event {
                    RobotEvent::ServiceStarted => Readiness::Ready,
                    RobotEvent::ServiceStopped => Readiness::NotReady,
                };
                info!("Robot service event {:?}, readiness is now {}.", event, next);
                if tx.send(next).is_err() {
                    break;
                }
            }
        });
        Self {
            agent: Some(agent),
            readiness: rx,
        }
    }

    pub fn readiness(&self) -> Readiness {
        *self.readiness.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// Whether a real agent sits behind the seam (false in simulation).
    pub fn hardware_live(&self) -> bool {
        self.agent.is_some()
    }

    pub fn agent(&self) -> Option<&Arc<dyn RobotAgent>> {
        self.agent.as_ref()
    }

    /// Wait until the robot service reports Ready. Returns immediately in
    /// simulation mode.
    pub async fn wait_ready(&self) {
        let mut rx = self.readiness.clone();
        if *rx.borrow() == Readiness::Ready {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() == Readiness::Ready {
                return;
            }
        }
        warn!("Robot event stream closed before the service became ready.");
    }

    /// Speak through the robot when possible, otherwise log the line.
    pub fn speak(&self, text: &str) {
        match &self.agent {
            None => info!("TTS (simulated): {}", text),
            Some(agent) if self.is_ready() => {
                if let Err(e) = agent.start_tts(text) {
                    warn!("TTS request failed: {}", e);
                }
            }
            Some(_) => warn!("Robot service not ready, dropping TTS line: {}", text),
        }
    }

    /// Best-effort release of the underlying agent handle.
    pub fn release(&self) {
        if let Some(agent) = &self.agent {
            agent.release();
        }
    }

    #[cfg(test)]
    pub(crate) fn fixed(agent: Option<Arc<dyn RobotAgent>>, state: Readiness) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self {
            agent,
            readiness: rx,
        }
    }
}

/// In-process stand-in for the vendor robot service. Logs every actuation
/// and emits ServiceStarted shortly after construction, the way the real
/// service binds asynchronously. A vendor-backed implementation drops in
/// behind [`RobotAgent`] without touching the rest of the service.
pub struct LoopbackRobot;

impl LoopbackRobot {
    pub fn spawn() -> (Arc<Self>, mpsc::Receiver<RobotEvent>) {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            sleep(Duration::from_millis(250)).await;
            let _ = tx.send(RobotEvent::ServiceStarted).await;
        });
        (Arc::new(Self), rx)
    }
}

impl RobotAgent for LoopbackRobot {
    fn control_motor(&self, motor_code: i32, angle: f32, speed: i32) -> Result<(), AgentError> {
        info!("controlMotor(motor={}, angle={}, speed={})", motor_code, angle, speed);
        Ok(())
    }

    fn start_tts(&self, text: &str) -> Result<(), AgentError> {
        info!("TTS: {}", text);
        Ok(())
    }

    fn release(&self) {
        info!("Robot handle released.");
    }
}
