pub mod color;
pub mod geometry;
pub mod ids;
pub mod value;

pub use color::Color;
pub use geometry::{Rect, Size};
pub use ids::{FieldSlot, GroupId, ParameterSlot, VariableSlot};
pub use value::{Value, ValueType};

// Re-exported so downstream crates agree on the numeric and date types.
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
