pub mod apply;
pub mod cli;
pub mod config;
pub mod editor;
pub mod effective;
pub mod error;
pub mod groovy;
pub mod hash;
pub mod merge;
pub mod model;
pub mod plugins;
pub mod span;
pub mod translate;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
