pub mod codec;
pub mod commands;
pub mod error;
pub mod fs_utils;
pub mod package;
pub mod paths;
pub mod profile;
pub mod store;
pub mod swap;
pub mod system;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
