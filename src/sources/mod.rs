pub mod local;

pub use local::LocalSource;
