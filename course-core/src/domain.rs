pub mod answer;
pub mod attempt;
pub mod challenge;
pub mod ids;
pub mod lookup;
pub mod prompt;
pub mod question;
pub mod report;

pub use answer::*;
pub use attempt::*;
pub use challenge::*;
pub use ids::*;
pub use lookup::*;
pub use prompt::*;
pub use question::*;
pub use report::*;
