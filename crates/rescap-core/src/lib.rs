//! Rescap Core
//!
//! Typed resource quantities for workflow tasks:
//!
//! - [`ResourceKind`]: the closed set of dimensions (memory, time, cpus)
//! - [`ResourceValue`]: a quantity paired with its kind
//! - [`MemorySize`] and [`parse_duration`]: parsers for the loose unit
//!   strings administrators write in config files (`"128.GB"`, `"240.h"`)
//!
//! ```ignore
//! use rescap_core::{ResourceKind, ResourceValue};
//!
//! let mem = ResourceValue::parse(ResourceKind::Memory, "128.GB")?;
//! assert_eq!(mem.to_string(), "128 GB");
//! ```

pub mod duration;
pub mod error;
pub mod kind;
pub mod memory;

pub use duration::{format_duration, parse_duration};
pub use error::{UnitError, UnitResult};
pub use kind::{ResourceKind, ResourceValue, parse_cpus};
pub use memory::MemorySize;
