pub mod settings;
pub mod status;
pub mod sync;
pub mod versions;
