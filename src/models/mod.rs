pub mod approval;
pub mod audit;
pub mod c2m2;
pub mod pagination;
pub mod risk;
pub mod stakeholder;

// Re-export commonly used types
pub use approval::*;
pub use audit::*;
pub use c2m2::*;
pub use pagination::*;
pub use risk::*;
pub use stakeholder::*;
