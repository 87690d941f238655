//! Pure data structures exchanged between the container, the deployment core
//! and the listeners.

pub mod application;
pub mod binding;
pub mod resource;

pub use application::*;
pub use binding::*;
pub use resource::*;
