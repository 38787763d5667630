pub mod clock;
pub mod image_ref;
pub mod orchestrator;
pub mod replicate;
pub mod staging;
