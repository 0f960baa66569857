use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LockType {
    #[default]
    #[serde(rename = "full")]
    FullAccess,
    #[serde(rename = "read")]
    ReadOnly,
    #[serde(rename = "none")]
    NoAccess,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::FullAccess => "full",
            LockType::ReadOnly => "read",
            LockType::NoAccess => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UniversalState {
    Created,
    Frozen,
    #[default]
    Active,
    Effective,
    Terminated,
}

impl UniversalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniversalState::Created => "created",
            UniversalState::Frozen => "frozen",
            UniversalState::Active => "active",
            UniversalState::Effective => "effective",
            UniversalState::Terminated => "terminated",
        }
    }
}

impl std::str::FromStr for UniversalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(UniversalState::Created),
            "frozen" => Ok(UniversalState::Frozen),
            "active" => Ok(UniversalState::Active),
            "effective" => Ok(UniversalState::Effective),
            "terminated" => Ok(UniversalState::Terminated),
            other => Err(format!("unknown universal state '{}'", other)),
        }
    }
}

/// Named transitions exposed over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StateTransition {
    Activate,
    Deactivate,
    Terminate,
}

impl StateTransition {
    pub fn target(&self) -> UniversalState {
        match self {
            StateTransition::Activate => UniversalState::Active,
            StateTransition::Deactivate => UniversalState::Frozen,
            StateTransition::Terminate => UniversalState::Terminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_target_expected_states() {
        assert_eq!(StateTransition::Activate.target(), UniversalState::Active);
        assert_eq!(StateTransition::Deactivate.target(), UniversalState::Frozen);
        assert_eq!(StateTransition::Terminate.target(), UniversalState::Terminated);
    }

    #[test]
    fn lock_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&LockType::ReadOnly).unwrap(),
            "\"read\""
        );
        assert_eq!(LockType::default().as_str(), "full");
        assert_eq!(UniversalState::default().as_str(), "active");
        assert_eq!("frozen".parse::<UniversalState>(), Ok(UniversalState::Frozen));
    }
}
