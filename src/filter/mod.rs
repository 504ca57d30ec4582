//! Filter compilation from request query parameters
//!
//! Turns the query parameters left over after pagination, field selection and
//! sorting into a MongoDB-style filter document.
//!
//! # Value syntax
//!
//! ```text
//! name=lucas                 {name: "lucas"}
//! age=30                     {age: 30}            ("009" stays a string)
//! age=gt:30                  {age: {$gt: 30}}     (gte:, gt:, lte:, lt:)
//! name=lu*                   {name: {$regex: "^l[u,ü,ú,ù]", $options: "i"}}
//! timestamp=2018-12-05       {timestamp: "2018-12-05T00:00:00"}
//! job=dev,qa                 {$or: [{job: "dev"}, {job: "qa"}]}
//! age=gte:5&age=lte:9        {$and: [{age: {$gte: 5}}, {age: {$lte: 9}}]}
//! ```
//!
//! # Date ranges
//!
//! ```text
//! start_at=2019-01-24                   [2019-01-24T00:00:00, end of today)
//! start_at=...&end_at=...               [start_at, end_at)
//! period=1m&start_at=2019-01-24         [2019-01-24T00:00:00, 2019-02-24T23:59:59)
//! period=1w&end_at=2019-01-26           [2019-01-19T00:00:00, 2019-01-26T23:59:59)
//! period=7d                             the last seven days up to end of today
//! ```
//!
//! `date_start`/`date_end` are accepted as aliases of `start_at`/`end_at`, and
//! both accept `today`.

pub mod classify;
pub mod comparison;
pub mod compiler;
pub mod document;
pub mod error;
pub mod period;
pub mod wildcard;

pub use classify::{TypedValue, classify};
pub use comparison::{Comparison, Operator, parse_comparison};
pub use compiler::{RESERVED_KEYS, compile, sanitize_field};
pub use document::{Clause, FilterDocument};
pub use error::PeriodParseError;
pub use period::{DateRange, Period, PeriodUnit, resolve_date_range};
pub use wildcard::{RegexPattern, compile_wildcard};
