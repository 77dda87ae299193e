/// Broad failure category; decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input file or configuration. Nothing is loaded.
    InputFormat,
    /// The file parsed, but no usable rows remained.
    NoData,
    /// Model fitting or inference failed.
    Training,
    /// Reading or writing an output artifact failed.
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InputFormat | ErrorKind::Io => 2,
            ErrorKind::NoData => 3,
            ErrorKind::Training => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputFormat, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoData, message)
    }

    pub fn training(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Training, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Re-tag an error as a training failure, keeping the message.
    ///
    /// Everything that goes wrong between "data is loaded" and "forecasts are
    /// ready" is reported to the user as one training error.
    pub fn into_training(self) -> Self {
        Self {
            kind: ErrorKind::Training,
            message: self.message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::input("x").exit_code(), 2);
        assert_eq!(AppError::no_data("x").exit_code(), 3);
        assert_eq!(AppError::training("x").exit_code(), 4);
        assert_eq!(AppError::io("x").exit_code(), 2);
    }

    #[test]
    fn into_training_keeps_message() {
        let err = AppError::input("Unknown product 'Z'").into_training();
        assert_eq!(err.kind(), ErrorKind::Training);
        assert_eq!(err.to_string(), "Unknown product 'Z'");
    }
}
