use serde::Deserialize;

/// One element of an inbound command payload:
/// `[{"motorId":"NECK_Y","angle":30.0},{"motorId":"LEFT_ELBOW_Y","angle":-15.5}]`
#[derive(Debug, Clone, Deserialize)]
pub struct MotorCommand {
    #[serde(rename = "motorId")]
    pub motor_id: String,
    pub angle: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_command_array() {
        let payload = r#"[{"motorId":"NECK_Y","angle":30.0},{"motorId":"LEFT_ELBOW_Y","angle":-15.5}]"#;
        let commands: Vec<MotorCommand> = serde_json::from_str(payload).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].motor_id, "NECK_Y");
        assert_eq!(commands[0].angle, 30.0);
        assert_eq!(commands[1].motor_id, "LEFT_ELBOW_Y");
        assert_eq!(commands[1].angle, -15.5);
    }

    #[test]
    fn test_missing_angle_is_an_error() {
        let payload = r#"[{"motorId":"NECK_Y"}]"#;
        assert!(serde_json::from_str::<Vec<MotorCommand>>(payload).is_err());
    }
}
