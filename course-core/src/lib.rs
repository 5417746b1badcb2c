pub mod classifier;
pub mod domain;
pub mod error;
pub mod extraction;
pub mod traits;

pub use classifier::*;
pub use domain::*;
pub use error::*;
pub use extraction::*;
pub use traits::*;
