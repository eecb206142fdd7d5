pub mod common;
pub mod patients;
pub mod consultations;
pub mod users;
pub mod dashboard;

pub use common::*;
pub use patients::*;
pub use consultations::*;
pub use users::*;
pub use dashboard::*;
