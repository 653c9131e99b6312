use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum StudioError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    SlugConflict(String),
    Unauthorized(String),
    Render(String),
}

impl StudioError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            StudioError::DatabaseConfig(_) => "E001",
            StudioError::DatabaseConnection(_) => "E002",
            StudioError::DatabaseOperation(_) => "E003",
            StudioError::FileOperation(_) => "E004",
            StudioError::Validation(_) => "E005",
            StudioError::NotFound(_) => "E006",
            StudioError::Serialization(_) => "E007",
            StudioError::SlugConflict(_) => "E008",
            StudioError::Unauthorized(_) => "E009",
            StudioError::Render(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            StudioError::DatabaseConfig(_) => "Database Configuration Error",
            StudioError::DatabaseConnection(_) => "Database Connection Error",
            StudioError::DatabaseOperation(_) => "Database Operation Error",
            StudioError::FileOperation(_) => "File Operation Error",
            StudioError::Validation(_) => "Validation Error",
            StudioError::NotFound(_) => "Resource Not Found",
            StudioError::Serialization(_) => "Serialization Error",
            StudioError::SlugConflict(_) => "Slug Conflict",
            StudioError::Unauthorized(_) => "Unauthorized",
            StudioError::Render(_) => "Render Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            StudioError::DatabaseConfig(msg)
            | StudioError::DatabaseConnection(msg)
            | StudioError::DatabaseOperation(msg)
            | StudioError::FileOperation(msg)
            | StudioError::Validation(msg)
            | StudioError::NotFound(msg)
            | StudioError::Serialization(msg)
            | StudioError::SlugConflict(msg)
            | StudioError::Unauthorized(msg)
            | StudioError::Render(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            StudioError::Validation(_) | StudioError::Serialization(_) => StatusCode::BAD_REQUEST,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::SlugConflict(_) => StatusCode::CONFLICT,
            StudioError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StudioError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            StudioError::DatabaseConfig(_)
            | StudioError::DatabaseOperation(_)
            | StudioError::FileOperation(_)
            | StudioError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for StudioError {}

// 便捷的构造函数
impl StudioError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        StudioError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        StudioError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        StudioError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        StudioError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        StudioError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        StudioError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        StudioError::Serialization(msg.into())
    }

    pub fn slug_conflict<T: Into<String>>(msg: T) -> Self {
        StudioError::SlugConflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        StudioError::Unauthorized(msg.into())
    }

    pub fn render<T: Into<String>>(msg: T) -> Self {
        StudioError::Render(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for StudioError {
    fn from(err: sea_orm::DbErr) -> Self {
        StudioError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for StudioError {
    fn from(err: image::ImageError) -> Self {
        StudioError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(StudioError::validation("x").code(), "E005");
        assert_eq!(StudioError::slug_conflict("x").code(), "E008");
        assert_eq!(StudioError::render("x").code(), "E010");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            StudioError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StudioError::not_found("gone").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StudioError::slug_conflict("taken").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StudioError::unauthorized("pw").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            StudioError::database_connection("down").http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_format_simple() {
        let err = StudioError::validation("Slug already in use");
        assert_eq!(err.format_simple(), "Validation Error: Slug already in use");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_db_err() {
        let err: StudioError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, StudioError::DatabaseOperation(_)));
    }
}
