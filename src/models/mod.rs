pub mod priority;
pub mod test_case;
pub mod test_type;

pub use priority::Priority;
pub use test_case::TestCase;
pub use test_type::TestType;
