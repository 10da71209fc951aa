pub mod apk;
pub mod errors;
pub mod manifest;
pub mod patterns;

pub use apk::Apk;
pub use errors::ApkError;
pub use manifest::{Component, Manifest};
