use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed dice string. Only reachable through bad catalog data.
    #[error("invalid dice expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },
    #[error("maneuver '{maneuver}' needs exactly one selected enemy")]
    NoTargetSelected { maneuver: String },
    #[error("not enough command points: need {needed}, have {available}")]
    InsufficientCommandPoints { needed: i32, available: i32 },
    #[error("'{key}' is on cooldown for {rounds} more round(s)")]
    AbilityOnCooldown { key: String, rounds: u32 },
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("unknown maneuver '{0}'")]
    UnknownManeuver(String),
    #[error("maneuver '{key}' is not available to {unit}")]
    ManeuverUnavailable { key: String, unit: String },
}
