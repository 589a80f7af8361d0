//! Artifact persistence
//!
//! Fitted preprocessors and trained models are written with
//! [`save_object`] and read back with [`load_object`].

mod serializer;

pub use serializer::{load_object, save_object, SerializedObject};
