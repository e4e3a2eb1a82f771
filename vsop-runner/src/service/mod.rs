//! Service layer
//!
//! Services perform the side effects stages need, such as running external
//! programs. They are trait-based so stages can be exercised with fakes.

mod interrupt;
mod process;

// Re-export traits
pub use process::ProcessService;

// Re-export implementations
pub use interrupt::Interrupt;
pub use process::StandardProcessService;
