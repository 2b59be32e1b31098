pub mod batch;
pub mod examples;
pub mod generate;
pub mod setup;

pub use batch::*;
pub use examples::*;
pub use generate::*;
pub use setup::*;
