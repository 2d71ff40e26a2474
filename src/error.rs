use thiserror::Error;

use crate::renderer::ShaderStage;

/// Every failure here is terminal to the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("failed to load graphics driver: {0}")]
    DriverLoad(String),

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    #[error("failed to upload geometry: {0}")]
    GeometryUpload(String),

    #[error("graphics device error: {0}")]
    Device(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn exit_code(&self) -> i32 {
        -1
    }

    /// The one line printed to stdout before exiting, if any.
    pub fn diagnostic(&self) -> Option<&'static str> {
        match self {
            AppError::WindowCreation(_) => Some("Failed to create window"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_exits_with_minus_one() {
        let errors = vec![
            AppError::WindowCreation("no display".into()),
            AppError::DriverLoad("no adapter".into()),
            AppError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log: "ERROR: 0:1".into(),
            },
            AppError::ShaderLink("interface mismatch".into()),
            AppError::GeometryUpload("out of memory".into()),
            AppError::Device("device lost".into()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), -1);
        }
    }

    #[test]
    fn only_window_failure_prints_a_diagnostic() {
        let window = AppError::WindowCreation("no display".into());
        assert_eq!(window.diagnostic(), Some("Failed to create window"));

        assert_eq!(AppError::DriverLoad("no adapter".into()).diagnostic(), None);
        assert_eq!(AppError::ShaderLink("mismatch".into()).diagnostic(), None);
        assert_eq!(AppError::Device("device lost".into()).diagnostic(), None);
    }

    #[test]
    fn compile_error_carries_stage_and_log() {
        let err = AppError::ShaderCompile {
            stage: ShaderStage::Vertex,
            log: "ERROR: 0:3: 'foo' : undeclared identifier".into(),
        };
        let message = err.to_string();
        assert!(message.starts_with("vertex shader failed to compile"));
        assert!(message.contains("undeclared identifier"));
    }
}
