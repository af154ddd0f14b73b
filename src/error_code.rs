use std::fmt;

/// iRODS error codes are negative multiples of 1000; the server may add
/// the errno of the underlying failure to the low three digits, so
/// `-808123` still means `CAT_NO_ROWS_FOUND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCodeKind {
    /// Error code -808000
    CatNoRowsFound,
    /// Error code -826000
    CatInvalidAuthentication,
    /// Error code -827000
    CatInvalidUser,
    /// Error code -840000
    CatPasswordExpired,
    Unknown,
}

impl From<i32> for ErrorCodeKind {
    fn from(code: i32) -> ErrorCodeKind {
        match code - code % 1000 {
            -808000 => ErrorCodeKind::CatNoRowsFound,
            -826000 => ErrorCodeKind::CatInvalidAuthentication,
            -827000 => ErrorCodeKind::CatInvalidUser,
            -840000 => ErrorCodeKind::CatPasswordExpired,
            _ => ErrorCodeKind::Unknown,
        }
    }
}

impl ErrorCodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCodeKind::CatNoRowsFound => "CAT_NO_ROWS_FOUND",
            ErrorCodeKind::CatInvalidAuthentication => "CAT_INVALID_AUTHENTICATION",
            ErrorCodeKind::CatInvalidUser => "CAT_INVALID_USER",
            ErrorCodeKind::CatPasswordExpired => "CAT_PASSWORD_EXPIRED",
            ErrorCodeKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorCode {
    pub kind: ErrorCodeKind,
    pub code: i32,
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == other.code
    }
}

impl ErrorCode {
    pub fn parse(code: i32) -> Self {
        let kind = ErrorCodeKind::from(code);

        Self { kind, code }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind.name(), self.code)
    }
}
