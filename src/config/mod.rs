mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, init_config_with, try_get_config};
pub use structs::*;
