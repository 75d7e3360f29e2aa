pub mod assets;
pub mod engine;
pub mod paths;
