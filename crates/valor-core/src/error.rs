//! Error taxonomy of the progression ledger
//!
//! Every domain failure carries an [`ErrorCode`] callers can branch on.
//! Only [`Error::Internal`] wraps opaque lower-level faults.

use crate::identity::HeroId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable failure codes exposed to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidParams,
    ResourceNotFound,
    DuplicateResource,
    PermissionDenied,
    HeroNotFound,
    SkillNotFound,
    InsufficientExperience,
    InsufficientGold,
    OperationExpired,
    InternalError,
}

impl ErrorCode {
    /// Numeric value used on the wire
    ///
    /// The 8000xx range beyond `HeroNotFound` holds the progression codes
    /// for spending and rollback failures.
    pub fn as_u32(self) -> u32 {
        match self {
            ErrorCode::InternalError => 100001,
            ErrorCode::InvalidParams => 100002,
            ErrorCode::ResourceNotFound => 100404,
            ErrorCode::DuplicateResource => 100409,
            ErrorCode::PermissionDenied => 300001,
            ErrorCode::HeroNotFound => 800001,
            ErrorCode::InsufficientExperience => 800010,
            ErrorCode::InsufficientGold => 800011,
            ErrorCode::OperationExpired => 800020,
            ErrorCode::SkillNotFound => 810001,
        }
    }

    /// Name of the code as used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidParams => "invalid_params",
            ErrorCode::ResourceNotFound => "resource_not_found",
            ErrorCode::DuplicateResource => "duplicate_resource",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::HeroNotFound => "hero_not_found",
            ErrorCode::SkillNotFound => "skill_not_found",
            ErrorCode::InsufficientExperience => "insufficient_experience",
            ErrorCode::InsufficientGold => "insufficient_gold",
            ErrorCode::OperationExpired => "operation_expired",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Hero not found: {0}")]
    HeroNotFound(HeroId),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Insufficient experience: need {required}, have {available}")]
    InsufficientExperience { required: u64, available: u64 },

    #[error("Insufficient gold: need {required}, have {available}")]
    InsufficientGold { required: u64, available: u64 },

    #[error("Operation expired: rollback deadline {deadline} passed at {now}")]
    OperationExpired {
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The code callers branch on
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidParams(_) => ErrorCode::InvalidParams,
            Error::ResourceNotFound(_) => ErrorCode::ResourceNotFound,
            Error::DuplicateResource(_) => ErrorCode::DuplicateResource,
            Error::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Error::HeroNotFound(_) => ErrorCode::HeroNotFound,
            Error::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Error::InsufficientExperience { .. } => ErrorCode::InsufficientExperience,
            Error::InsufficientGold { .. } => ErrorCode::InsufficientGold,
            Error::OperationExpired { .. } => ErrorCode::OperationExpired,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn internal(msg: impl fmt::Display) -> Self {
        Error::Internal(msg.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ErrorCode::InvalidParams,
            ErrorCode::ResourceNotFound,
            ErrorCode::DuplicateResource,
            ErrorCode::PermissionDenied,
            ErrorCode::HeroNotFound,
            ErrorCode::SkillNotFound,
            ErrorCode::InsufficientExperience,
            ErrorCode::InsufficientGold,
            ErrorCode::OperationExpired,
            ErrorCode::InternalError,
        ];
        let mut values: Vec<u32> = codes.iter().map(|c| c.as_u32()).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), codes.len());
    }

    #[test]
    fn test_error_code_mapping() {
        let err = Error::InsufficientExperience {
            required: 80,
            available: 20,
        };
        assert_eq!(err.code(), ErrorCode::InsufficientExperience);
        assert_eq!(err.to_string(), "Insufficient experience: need 80, have 20");
        assert_eq!(
            Error::HeroNotFound(HeroId(7)).code().as_str(),
            "hero_not_found"
        );
    }
}
