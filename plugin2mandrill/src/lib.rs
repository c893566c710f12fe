//! Convert Assembly plugin XML into Mandrill tag definition source.

pub mod convert;
pub mod driver;
pub mod emit;
pub mod field;
pub mod reporting;

pub use driver::{Driver, Status};

/// File id within the driver's source file database.
pub type FileId = usize;

/// The URL to direct users to when filing bug reports.
pub const BUG_REPORT_URL: &str = "https://github.com/yeslogic/plugin2mandrill/issues";
