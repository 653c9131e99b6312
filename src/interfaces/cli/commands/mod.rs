mod config_gen;
mod qr_render;

pub use config_gen::config_generate;
pub use qr_render::qr_render;
