//! Fluent construction of households
//!
//! Households are plain serde data and can be loaded from a scenario file,
//! but tests, benches and embedding hosts usually build them in code:
//!
//! ```ignore
//! use nestegg_core::config::{HouseholdBuilder, PersonBuilder};
//! use nestegg_core::model::{Province, Strategy};
//!
//! let household = HouseholdBuilder::new(
//!         PersonBuilder::new("Rafael", 67)
//!             .rrif(350_000.0)
//!             .cpp(65, 12_492.0)
//!             .oas(65, 8_904.0),
//!     )
//!     .province(Province::AB)
//!     .start_year(2033)
//!     .strategy(Strategy::RrifFrontload)
//!     .spending(60_000.0)
//!     .pension(0, "Employer DB", 100_000.0, 67)
//!     .build();
//! ```

mod builder;

pub use builder::{HouseholdBuilder, PersonBuilder};
