//! Model export and serialization module
//!
//! One artifact per exercise, named after the exercise and the winning
//! algorithm, stored as a checksummed bincode envelope.

mod serializer;

pub use serializer::{
    artifact_file_name, load_model, sanitize_exercise_name, save_exercise_model, save_model,
    ModelMetadata, SerializedModel,
};
