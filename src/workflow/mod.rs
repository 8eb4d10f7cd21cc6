pub mod adjustment;
pub mod batch;
pub mod grades;
pub mod revision;
