mod engine;
pub mod form;
mod types;

pub use engine::{deflate, project};
pub use form::{Calculator, CalculatorForm, ContributionField, Field, FieldKind, coerce_field};
pub use types::{
    ChartRow, IntermediateContribution, MONTHS_PER_YEAR, Projection, ProjectionInput,
    ProjectionSummary, SAFE_WITHDRAWAL_RATE, YearSnapshot,
};
