pub mod config;
pub mod credentials;
pub mod deploy;
pub mod ec2;
pub mod error;
pub mod github;
pub mod http;
pub mod image;
pub mod intent;
pub mod paths;
pub mod provisioner;
pub mod rollback;
pub mod taskcluster;
pub mod tooltool;

pub use error::{OccError, Result};
