//! Input validation layer
//!
//! 1. **window** - appointment window consistency of indirect edges
//! 2. **seed_schema** - seed document schema checks before import

pub mod seed_schema;
pub mod window;

pub use seed_schema::{parse_mapping_object, validate_seed, SeedDocument, SeedMapping, SeedValidation};
pub use window::{check_window, eligibility, Eligibility, IndirectFilter};
