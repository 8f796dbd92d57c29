// Library for tests to access modules

pub mod alert;
pub mod config;
pub mod error;
pub mod exporter;
pub mod format;
pub mod history;
pub mod models;
pub mod notifier;
pub mod sampler;
pub mod supervisor;
