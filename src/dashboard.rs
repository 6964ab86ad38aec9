use crate::motors::MotorAxis;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Oldest log lines are dropped past this point.
const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Lost(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Connected => f.write_str("connected"),
            ConnectionStatus::Lost(cause) => write!(f, "connection lost: {}", cause),
        }
    }
}

/// Passive display state: one readout per motor axis, a rolling log panel
/// and the broker connection line. Written from the dispatcher and the MQTT
/// service, read by the REST surface.
pub struct Dashboard {
    inner: Mutex<DashboardInner>,
}

struct DashboardInner {
    angles: HashMap<MotorAxis, f32>,
    log: VecDeque<String>,
    connection: ConnectionStatus,
}

impl Dashboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(DashboardInner {
                angles: HashMap::new(),
                log: VecDeque::new(),
                connection: ConnectionStatus::Disconnected,
            }),
        })
    }

    pub async fn set_angle(&self, axis: MotorAxis, angle: f32) {
        let mut inner = self.inner.lock().await;
        inner.angles.insert(axis, angle);
    }

    pub async fn angle(&self, axis: MotorAxis) -> Option<f32> {
        let inner = self.inner.lock().await;
        inner.angles.get(&axis).copied()
    }

    /// All ten axes in their fixed display order. Axes that have not
    /// received a command yet read as `None`.
    pub async fn snapshot(&self) -> Vec<(MotorAxis, Option<f32>)> {
        let inner = self.inner.lock().await;
        MotorAxis::ALL
            .iter()
            .map(|axis| (*axis, inner.angles.get(axis).copied()))
            .collect()
    }

    pub async fn push_log(&self, line: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        if inner.log.len() == LOG_CAPACITY {
            inner.log.pop_front();
        }
        inner.log.push_back(line.into());
    }

    /// The most recent `limit` log lines, oldest first.
    pub async fn recent_log(&self, limit: usize) -> Vec<String> {
        let inner = self.inner.lock().await;
        let skip = inner.log.len().saturating_sub(limit);
        inner.log.iter().skip(skip).cloned().collect()
    }

    pub async fn set_connection(&self, status: ConnectionStatus) {
        let mut inner = self.inner.lock().await;
        inner.connection = status;
    }

    pub async fn connection(&self) -> ConnectionStatus {
        let inner = self.inner.lock().await;
        inner.connection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_angle_readout_updates() {
        let dashboard = Dashboard::new();
        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, None);

        dashboard.set_angle(MotorAxis::NeckY, 30.0).await;
        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, Some(30.0));
        assert_eq!(dashboard.angle(MotorAxis::NeckZ).await, None);
    }

    #[tokio::test]
    async fn test_snapshot_covers_every_axis() {
        let dashboard = Dashboard::new();
        dashboard.set_angle(MotorAxis::LeftElbowY, -15.5).await;

        let snapshot = dashboard.snapshot().await;
        assert_eq!(snapshot.len(), MotorAxis::ALL.len());
        assert!(snapshot.contains(&(MotorAxis::LeftElbowY, Some(-15.5))));
        assert!(snapshot.contains(&(MotorAxis::NeckY, None)));
    }

    #[tokio::test]
    async fn test_log_stays_bounded() {
        let dashboard = Dashboard::new();
        for i in 0..LOG_CAPACITY + 10 {
            dashboard.push_log(format!("line {}", i)).await;
        }

        let lines = dashboard.recent_log(LOG_CAPACITY * 2).await;
        assert_eq!(lines.len(), LOG_CAPACITY);
        assert_eq!(lines.last().unwrap(), &format!("line {}", LOG_CAPACITY + 9));
    }

    #[tokio::test]
    async fn test_recent_log_honors_limit() {
        let dashboard = Dashboard::new();
        for i in 0..10 {
            dashboard.push_log(format!("line {}", i)).await;
        }

        let lines = dashboard.recent_log(3).await;
        assert_eq!(lines, vec!["line 7", "line 8", "line 9"]);
    }
}
