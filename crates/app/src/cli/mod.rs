pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Content, Health, Init, Serve, Version};
