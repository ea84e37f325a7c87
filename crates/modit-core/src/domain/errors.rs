use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ModitResult<T> = Result<T, ModitError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModitErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl ModitErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModitError {
    category: ModitErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ModitError {
    pub fn new(
        category: ModitErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            ModitErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ModitErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ModitErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ModitErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ModitErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for ModitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for ModitError {}

#[cfg(test)]
mod tests {
    use super::{ModitError, ModitErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (ModitErrorCategory::InputValidationError, 2, "InputValidationError"),
            (ModitErrorCategory::IoSystemError, 3, "IoSystemError"),
            (ModitErrorCategory::ComputationError, 4, "ComputationError"),
            (ModitErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn error_renders_diagnostic_lines() {
        let error = ModitError::input_validation(
            "INPUT.WAVENUMBER_GRID",
            "wavenumber grid is not log-uniform at index 3",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.WAVENUMBER_GRID] wavenumber grid is not log-uniform at index 3"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "InputValidationError [INPUT.WAVENUMBER_GRID] wavenumber grid is not log-uniform at index 3"
        );
    }
}
