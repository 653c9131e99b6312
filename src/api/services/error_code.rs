//! 统一 API 错误码定义

use serde::{Serialize, Serializer};

use crate::errors::StudioError;

/// API 错误码枚举
///
/// 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 记录错误
/// - 4000-4099: 二维码资源错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    PayloadTooLarge = 1011,
    ServiceUnavailable = 1030,

    // 记录错误 3000-3099
    RecordNotFound = 3000,
    SlugConflict = 3001,
    EditorPasswordInvalid = 3004,
    RecordDatabaseError = 3005,

    // 二维码资源错误 4000-4099
    QrRenderFailed = 4000,
    QrInvalidFormat = 4001,
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*self as i32)
    }
}

impl From<&StudioError> for ErrorCode {
    fn from(err: &StudioError) -> Self {
        match err {
            StudioError::Validation(_) | StudioError::Serialization(_) => ErrorCode::BadRequest,
            StudioError::NotFound(_) => ErrorCode::RecordNotFound,
            StudioError::SlugConflict(_) => ErrorCode::SlugConflict,
            StudioError::Unauthorized(_) => ErrorCode::EditorPasswordInvalid,
            StudioError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            StudioError::DatabaseConfig(_) | StudioError::DatabaseOperation(_) => {
                ErrorCode::RecordDatabaseError
            }
            StudioError::Render(_) => ErrorCode::QrRenderFailed,
            StudioError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}

impl From<StudioError> for ErrorCode {
    fn from(err: StudioError) -> Self {
        ErrorCode::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::SlugConflict).unwrap(), "3001");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_from_studio_error() {
        assert_eq!(
            ErrorCode::from(StudioError::validation("x")),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ErrorCode::from(StudioError::database_connection("x")),
            ErrorCode::ServiceUnavailable
        );
        assert_eq!(
            ErrorCode::from(StudioError::unauthorized("x")),
            ErrorCode::EditorPasswordInvalid
        );
    }
}
