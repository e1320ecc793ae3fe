pub mod lifecycle;

pub use lifecycle::{ActionLifecycleStore, ChangeListener};
