use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Session directory error at {path}: {message}")]
    Directory { path: String, message: String },

    #[error("Hardware error in {component}: {message}")]
    Hardware { component: String, message: String },

    #[error("Output delivery error: {message}")]
    Output { message: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl BoothError {
    pub fn directory<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Directory {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn hardware<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Hardware {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn output<M: Into<String>>(message: M) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    pub fn system<M: Into<String>>(message: M) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BoothError>;
