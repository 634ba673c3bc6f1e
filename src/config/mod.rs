mod settings;

pub use settings::{LogFormat, LoggingConfig, PushConfig, Settings};
