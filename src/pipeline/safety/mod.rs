pub mod types;
pub mod sanitize;
pub mod urgency;
pub mod disclaimer;

pub use disclaimer::finalize;
pub use sanitize::sanitize_query;
pub use types::*;
pub use urgency::is_urgent;
