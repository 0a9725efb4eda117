mod citation;
mod claim;
mod report;
mod span;
mod verification;

pub use citation::*;
pub use claim::*;
pub use report::*;
pub use span::*;
pub use verification::*;
