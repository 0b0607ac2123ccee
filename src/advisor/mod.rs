/// Index advisors and their dispatch machinery
pub mod columns;
pub mod composite;
pub mod extremal;
pub mod function_index;
pub mod join;
pub mod optimizer;
pub mod pattern;
pub mod prefix;
pub mod recommendation;
pub mod version;
pub mod visitor;

pub use optimizer::{AdvisorContext, DrivingTable, Optimizer};
pub use recommendation::Recommendation;
