pub mod due;
pub mod flags;
pub mod grade;
pub mod queue;
pub mod review;
pub mod stats;
