#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidExprShape,
    UnknownNodeType,
    UnknownOp,
    MissingOperand,
    InvalidOperandKind,
    MissingOperandField,
    InvalidPath,
    InvalidChildren,
    MissingChild,
    InvalidArgs,
    InvalidRegex,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidExprShape => "InvalidExprShape",
            ErrorCode::UnknownNodeType => "UnknownNodeType",
            ErrorCode::UnknownOp => "UnknownOp",
            ErrorCode::MissingOperand => "MissingOperand",
            ErrorCode::InvalidOperandKind => "InvalidOperandKind",
            ErrorCode::MissingOperandField => "MissingOperandField",
            ErrorCode::InvalidPath => "InvalidPath",
            ErrorCode::InvalidChildren => "InvalidChildren",
            ErrorCode::MissingChild => "MissingChild",
            ErrorCode::InvalidArgs => "InvalidArgs",
            ErrorCode::InvalidRegex => "InvalidRegex",
        }
    }
}

/// A structural problem found while validating an authored condition tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionError {
    pub code: ErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl ConditionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ConditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) if !path.is_empty() => write!(f, "{}: {}", path, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConditionError {}

pub type ValidationResult = Result<(), Vec<ConditionError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidJson,
    InvalidYaml,
    InvalidCsv,
    InvalidShape,
}

/// Failure to turn authored text or data into one of the engine's typed inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        let kind = if err.is_data() {
            ParseErrorKind::InvalidShape
        } else {
            ParseErrorKind::InvalidJson
        };
        ParseError::new(kind, format!("json error: {}", err))
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        ParseError::new(ParseErrorKind::InvalidYaml, format!("yaml error: {}", err))
    }
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::new(ParseErrorKind::InvalidCsv, format!("csv error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_path() {
        let err = ConditionError::new(ErrorCode::UnknownOp, "unknown operator 'foo'")
            .with_path("AND[0]");
        assert_eq!(err.to_string(), "AND[0]: unknown operator 'foo'");
    }

    #[test]
    fn display_without_path_is_bare_message() {
        let err = ConditionError::new(ErrorCode::InvalidExprShape, "expression must be an object");
        assert_eq!(err.to_string(), "expression must be an object");
    }

    #[test]
    fn json_data_errors_are_shape_errors() {
        let err: ParseError = serde_json::from_str::<Vec<u8>>(r#"{"a":1}"#)
            .unwrap_err()
            .into();
        assert_eq!(err.kind, ParseErrorKind::InvalidShape);

        let err: ParseError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert_eq!(err.kind, ParseErrorKind::InvalidJson);
    }
}
