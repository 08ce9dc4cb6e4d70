use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_empty_input(&self) -> bool {
        self.code == 101
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        serialization_error(err)
    }
}

pub fn empty_input_error() -> Error {
    Error {
        code: 101,
        message: "empty input".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 102,
        message: "invalid input".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::debug!("database error: {:?}", err);

    Error {
        code: 2,
        message: "database error".into(),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::debug!("reqwest error: {}", err);

    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn serialization_error<T: Debug>(_: T) -> Error {
    Error {
        code: 5,
        message: "serialization error".into(),
    }
}

#[test]
fn error_taxonomy_test() {
    assert!(empty_input_error().is_empty_input());
    assert!(!invalid_input_error().is_empty_input());
    assert_eq!(
        format!("{}", upstream_error()),
        "upstream error (code 4)".to_string()
    );
}
