use std::fmt;

/// The ten robot joints this service can actuate.
///
/// Names match the symbolic ids used on the wire; codes match the motor
/// table of the robot service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorAxis {
    NeckY,
    NeckZ,
    RightShoulderZ,
    RightShoulderY,
    RightShoulderX,
    RightElbowY,
    LeftShoulderZ,
    LeftShoulderY,
    LeftShoulderX,
    LeftElbowY,
}

impl MotorAxis {
    pub const ALL: [MotorAxis; 10] = [
        MotorAxis::NeckY,
        MotorAxis::NeckZ,
        MotorAxis::RightShoulderZ,
        MotorAxis::RightShoulderY,
        MotorAxis::RightShoulderX,
        MotorAxis::RightElbowY,
        MotorAxis::LeftShoulderZ,
        MotorAxis::LeftShoulderY,
        MotorAxis::LeftShoulderX,
        MotorAxis::LeftElbowY,
    ];

    /// Symbolic name as it appears in command payloads.
    pub fn name(self) -> &'static str {
        match self {
            MotorAxis::NeckY => "NECK_Y",
            MotorAxis::NeckZ => "NECK_Z",
            MotorAxis::RightShoulderZ => "RIGHT_SHOULDER_Z",
            MotorAxis::RightShoulderY => "RIGHT_SHOULDER_Y",
            MotorAxis::RightShoulderX => "RIGHT_SHOULDER_X",
            MotorAxis::RightElbowY => "RIGHT_ELBOW_Y",
            MotorAxis::LeftShoulderZ => "LEFT_SHOULDER_Z",
            MotorAxis::LeftShoulderY => "LEFT_SHOULDER_Y",
            MotorAxis::LeftShoulderX => "LEFT_SHOULDER_X",
            MotorAxis::LeftElbowY => "LEFT_ELBOW_Y",
        }
    }

    /// Numeric motor code understood by the robot service.
    pub fn motor_code(self) -> i32 {
        match self {
            MotorAxis::NeckY => 1,
            MotorAxis::NeckZ => 2,
            MotorAxis::RightShoulderZ => 3,
            MotorAxis::RightShoulderY => 4,
            MotorAxis::RightShoulderX => 5,
            MotorAxis::RightElbowY => 6,
            MotorAxis::LeftShoulderZ => 7,
            MotorAxis::LeftShoulderY => 8,
            MotorAxis::LeftShoulderX => 9,
            MotorAxis::LeftElbowY => 10,
        }
    }

    /// Strict lookup from a wire name. Unknown names are rejected.
    pub fn from_name(name: &str) -> Option<MotorAxis> {
        MotorAxis::ALL.iter().copied().find(|axis| axis.name() == name)
    }
}

impl fmt::Display for MotorAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip_for_all_axes() {
        for axis in MotorAxis::ALL {
            assert_eq!(MotorAxis::from_name(axis.name()), Some(axis));
        }
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(MotorAxis::from_name("WAIST"), None);
        assert_eq!(MotorAxis::from_name("neck_y"), None);
        assert_eq!(MotorAxis::from_name(""), None);
    }

    #[test]
    fn test_motor_codes_are_distinct() {
        let mut codes: Vec<i32> = MotorAxis::ALL.iter().map(|a| a.motor_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), MotorAxis::ALL.len());
    }
}
