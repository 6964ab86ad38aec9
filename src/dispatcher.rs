use crate::dashboard::Dashboard;
use crate::models::MotorCommand;
use crate::motors::MotorAxis;
use crate::robot_agent::AgentHandle;
use std::sync::Arc;
use tracing::{info, warn};

/// Routes inbound command payloads to the dashboard readouts and, when the
/// robot service is live and ready, to the motor-control calls.
pub struct CommandDispatcher {
    dashboard: Arc<Dashboard>,
    agent: Arc<AgentHandle>,
    motor_speed: i32,
}

impl CommandDispatcher {
    pub fn new(dashboard: Arc<Dashboard>, agent: Arc<AgentHandle>, motor_speed: i32) -> Self {
        Self {
            dashboard,
            agent,
            motor_speed,
        }
    }

    /// Handle one inbound publish. Never fails outward: malformed input is
    /// logged and dropped so the stream keeps flowing.
    pub async fn handle_payload(&self, topic: &str, payload: &[u8]) {
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(_) => {
                warn!("Dropping non-UTF-8 payload on '{}'.", topic);
                self.dashboard.push_log(format!("({}) dropped non-UTF-8 payload", topic)).await;
                return;
            }
        };

        info!("Message on '{}': {}", topic, text);
        self.dashboard.push_log(format!("({}) {}", topic, text)).await;

        let commands: Vec<MotorCommand> = match serde_json::from_str(text) {
            Ok(commands) => commands,
            Err(e) => {
                warn!("Failed to decode motor commands: {}", e);
                self.dashboard.push_log(format!("decode error: {}", e)).await;
                return;
            }
        };

        if commands.is_empty() {
            info!("Command list is empty, nothing to apply.");
            return;
        }

        for command in commands {
            self.apply(command).await;
        }
    }

    /// One command: readout first, actuation second. A failure on either
    /// side never aborts the rest of the batch.
    async fn apply(&self, command: MotorCommand) {
        let Some(axis) = MotorAxis::from_name(&command.motor_id) else {
            warn!("Unknown motor id '{}', skipping command.", command.motor_id);
            self.dashboard.push_log(format!("unknown motor id '{}'", command.motor_id)).await;
            return;
        };

        self.dashboard.set_angle(axis, command.angle).await;

        if !self.agent.hardware_live() {
            info!("Simulation: {} -> {} not sent to hardware.", axis, command.angle);
            return;
        }
        if !self.agent.is_ready() {
            warn!("Robot service not ready, suppressing {} -> {}.", axis, command.angle);
            return;
        }
        if let Some(agent) = self.agent.agent() {
            info!("Driving motor {} -> {} (speed {}).", axis, command.angle, self.motor_speed);
            if let Err(e) = agent.control_motor(axis.motor_code(), command.angle, self.motor_speed) {
                warn!("Motor command for {} failed: {}", axis, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot_agent::{AgentError, Readiness, RobotAgent};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAgent {
        calls: Mutex<Vec<(i32, f32, i32)>>,
    }

    impl RecordingAgent {
        fn calls(&self) -> Vec<(i32, f32, i32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RobotAgent for RecordingAgent {
        fn control_motor(&self, motor_code: i32, angle: f32, speed: i32) -> Result<(), AgentError> {
            self.calls.lock().unwrap().push((motor_code, angle, speed));
            Ok(())
        }

        fn start_tts(&self, _text: &str) -> Result<(), AgentError> {
            Ok(())
        }

        fn release(&self) {}
    }

    fn ready_dispatcher() -> (CommandDispatcher, Arc<Dashboard>, Arc<RecordingAgent>) {
        let dashboard = Dashboard::new();
        let agent = Arc::new(RecordingAgent::default());
        let handle = Arc::new(AgentHandle::fixed(
            Some(agent.clone() as Arc<dyn RobotAgent>),
            Readiness::Ready,
        ));
        let dispatcher = CommandDispatcher::new(dashboard.clone(), handle, 45);
        (dispatcher, dashboard, agent)
    }

    #[tokio::test]
    async fn test_malformed_json_is_dropped() {
        let (dispatcher, dashboard, agent) = ready_dispatcher();
        dispatcher.handle_payload("robot/motors", b"not json at all").await;

        assert!(agent.calls().is_empty());
        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, None);
    }

    #[tokio::test]
    async fn test_empty_array_applies_nothing() {
        let (dispatcher, _dashboard, agent) = ready_dispatcher();
        dispatcher.handle_payload("robot/motors", b"[]").await;
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn test_null_payload_applies_nothing() {
        let (dispatcher, _dashboard, agent) = ready_dispatcher();
        dispatcher.handle_payload("robot/motors", b"null").await;
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_payload_is_dropped() {
        let (dispatcher, _dashboard, agent) = ready_dispatcher();
        dispatcher.handle_payload("robot/motors", &[0xff, 0xfe, 0x80]).await;
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_command_updates_readout_and_motor() {
        let (dispatcher, dashboard, agent) = ready_dispatcher();
        dispatcher
            .handle_payload("robot/motors", br#"[{"motorId":"NECK_Y","angle":30.0}]"#)
            .await;

        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, Some(30.0));
        assert_eq!(agent.calls(), vec![(MotorAxis::NeckY.motor_code(), 30.0, 45)]);
    }

    #[tokio::test]
    async fn test_unknown_motor_id_skips_only_that_command() {
        let (dispatcher, dashboard, agent) = ready_dispatcher();
        dispatcher
            .handle_payload(
                "robot/motors",
                br#"[{"motorId":"WAIST","angle":10.0},{"motorId":"LEFT_ELBOW_Y","angle":-15.5}]"#,
            )
            .await;

        // The sibling command still lands on both the readout and the motor.
        assert_eq!(dashboard.angle(MotorAxis::LeftElbowY).await, Some(-15.5));
        assert_eq!(
            agent.calls(),
            vec![(MotorAxis::LeftElbowY.motor_code(), -15.5, 45)]
        );
    }

    #[tokio::test]
    async fn test_motor_calls_suppressed_until_ready() {
        let dashboard = Dashboard::new();
        let agent = Arc::new(RecordingAgent::default());
        let handle = Arc::new(AgentHandle::fixed(
            Some(agent.clone() as Arc<dyn RobotAgent>),
            Readiness::Initializing,
        ));
        let dispatcher = CommandDispatcher::new(dashboard.clone(), handle, 45);

        dispatcher
            .handle_payload("robot/motors", br#"[{"motorId":"NECK_Y","angle":30.0}]"#)
            .await;

        // Readout still tracks the command, the hardware call does not.
        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, Some(30.0));
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn test_simulation_mode_skips_hardware() {
        let dashboard = Dashboard::new();
        let handle = Arc::new(AgentHandle::fixed(None, Readiness::Ready));
        let dispatcher = CommandDispatcher::new(dashboard.clone(), handle, 45);

        dispatcher
            .handle_payload("robot/motors", br#"[{"motorId":"RIGHT_SHOULDER_X","angle":5.0}]"#)
            .await;

        assert_eq!(dashboard.angle(MotorAxis::RightShoulderX).await, Some(5.0));
    }

    #[tokio::test]
    async fn test_configured_speed_is_used() {
        let dashboard = Dashboard::new();
        let agent = Arc::new(RecordingAgent::default());
        let handle = Arc::new(AgentHandle::fixed(
            Some(agent.clone() as Arc<dyn RobotAgent>),
            Readiness::Ready,
        ));
        let dispatcher = CommandDispatcher::new(dashboard, handle, 60);

        dispatcher
            .handle_payload("robot/motors", br#"[{"motorId":"NECK_Z","angle":-9.25}]"#)
            .await;

        assert_eq!(agent.calls(), vec![(MotorAxis::NeckZ.motor_code(), -9.25, 60)]);
    }

    struct FailingAgent;

    impl RobotAgent for FailingAgent {
        fn control_motor(&self, motor_code: i32, _angle: f32, _speed: i32) -> Result<(), AgentError> {
            Err(AgentError::Rejected(motor_code, "servo fault".to_string()))
        }

        fn start_tts(&self, _text: &str) -> Result<(), AgentError> {
            Err(AgentError::Unavailable("service gone".to_string()))
        }

        fn release(&self) {}
    }

    #[tokio::test]
    async fn test_agent_failures_do_not_abort_the_batch() {
        let dashboard = Dashboard::new();
        let handle = Arc::new(AgentHandle::fixed(
            Some(Arc::new(FailingAgent) as Arc<dyn RobotAgent>),
            Readiness::Ready,
        ));
        let dispatcher = CommandDispatcher::new(dashboard.clone(), handle, 45);

        dispatcher
            .handle_payload(
                "robot/motors",
                br#"[{"motorId":"NECK_Y","angle":30.0},{"motorId":"NECK_Z","angle":12.0}]"#,
            )
            .await;

        // Every readout still lands even though every hardware call failed.
        assert_eq!(dashboard.angle(MotorAxis::NeckY).await, Some(30.0));
        assert_eq!(dashboard.angle(MotorAxis::NeckZ).await, Some(12.0));
    }
}
