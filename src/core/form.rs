//! Raw field handling for the calculator: lenient number parsing, percentage
//! clamping, the intermediate-contribution rows, and the calculate/reset
//! lifecycle around [`project`].

use super::engine::project;
use super::types::{IntermediateContribution, Projection, ProjectionInput};

pub const DEFAULT_INITIAL_VALUE: f64 = 10_000.0;
pub const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 1_000.0;
pub const DEFAULT_REAL_INTEREST_RATE: f64 = 10.0;
pub const DEFAULT_INFLATION_RATE: f64 = 4.0;
pub const DEFAULT_YEARS_TO_RETIREMENT: f64 = 30.0;

/// Longest horizon a form converts to; anything above is cut down to this.
pub const MAX_HORIZON_YEARS: u32 = 1_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Currency,
    Number,
    Percentage,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    InitialValue,
    MonthlyContribution,
    RealInterestRate,
    InflationRate,
    YearsToRetirement,
}

impl Field {
    pub fn kind(self) -> FieldKind {
        match self {
            Field::InitialValue | Field::MonthlyContribution => FieldKind::Currency,
            Field::RealInterestRate | Field::InflationRate => FieldKind::Percentage,
            Field::YearsToRetirement => FieldKind::Number,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ContributionField {
    Year,
    Amount,
}

/// Parses user text into a number the way the form does: the longest numeric
/// prefix wins, anything unparseable becomes 0, percentages land in [0, 100].
pub fn coerce_field(kind: FieldKind, raw: &str) -> f64 {
    let value = parse_leading_number(raw).unwrap_or(0.0);
    match kind {
        FieldKind::Currency | FieldKind::Number => value,
        FieldKind::Percentage => clamp_percentage(value),
    }
}

pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn parse_leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Scalar fields and intermediate rows as the user has entered them.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorForm {
    pub initial_value: f64,
    pub monthly_contribution: f64,
    pub real_interest_rate: f64,
    pub inflation_rate: f64,
    pub years_to_retirement: f64,
    pub intermediate_contributions: Vec<IntermediateRow>,
}

/// An intermediate-contribution row before conversion; the year may still be
/// fractional or negative here.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntermediateRow {
    pub year: f64,
    pub amount: f64,
}

impl Default for CalculatorForm {
    fn default() -> Self {
        Self {
            initial_value: DEFAULT_INITIAL_VALUE,
            monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
            real_interest_rate: DEFAULT_REAL_INTEREST_RATE,
            inflation_rate: DEFAULT_INFLATION_RATE,
            years_to_retirement: DEFAULT_YEARS_TO_RETIREMENT,
            intermediate_contributions: Vec::new(),
        }
    }
}

impl CalculatorForm {
    pub fn set_field(&mut self, field: Field, raw: &str) {
        let value = coerce_field(field.kind(), raw);
        match field {
            Field::InitialValue => self.initial_value = value,
            Field::MonthlyContribution => self.monthly_contribution = value,
            Field::RealInterestRate => self.real_interest_rate = value,
            Field::InflationRate => self.inflation_rate = value,
            Field::YearsToRetirement => self.years_to_retirement = value,
        }
    }

    pub fn add_intermediate(&mut self) {
        self.intermediate_contributions.push(IntermediateRow {
            year: 1.0,
            amount: 0.0,
        });
    }

    pub fn update_intermediate(&mut self, index: usize, field: ContributionField, raw: &str) {
        let Some(row) = self.intermediate_contributions.get_mut(index) else {
            return;
        };
        match field {
            ContributionField::Year => row.year = coerce_field(FieldKind::Number, raw),
            ContributionField::Amount => row.amount = coerce_field(FieldKind::Currency, raw),
        }
    }

    pub fn remove_intermediate(&mut self, index: usize) {
        if index < self.intermediate_contributions.len() {
            self.intermediate_contributions.remove(index);
        }
    }

    /// Converts the form to engine input. The horizon is truncated toward
    /// zero, negative becomes 0 and it never exceeds [`MAX_HORIZON_YEARS`].
    /// A row whose year is not a whole number maps to year 0, which the
    /// engine never applies.
    pub fn to_input(&self) -> ProjectionInput {
        ProjectionInput {
            initial_value: self.initial_value,
            monthly_contribution: self.monthly_contribution,
            real_interest_rate_percent: self.real_interest_rate,
            inflation_rate_percent: self.inflation_rate,
            horizon_years: whole_years(self.years_to_retirement).min(MAX_HORIZON_YEARS),
            intermediate_contributions: self
                .intermediate_contributions
                .iter()
                .map(|row| IntermediateContribution {
                    year: contribution_year(row.year),
                    amount: row.amount,
                })
                .collect(),
        }
    }
}

fn whole_years(value: f64) -> u32 {
    // `as` saturates: NaN -> 0, negatives -> 0, huge -> u32::MAX.
    value.trunc() as u32
}

fn contribution_year(value: f64) -> u32 {
    if value.fract() == 0.0 {
        whole_years(value)
    } else {
        0
    }
}

/// Form plus the last computed projection.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    pub form: CalculatorForm,
    results: Option<Projection>,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the projection on the current form; the new result replaces any
    /// earlier one.
    pub fn calculate(&mut self) -> &Projection {
        self.results.insert(project(&self.form.to_input()))
    }

    pub fn reset(&mut self) {
        self.form = CalculatorForm::default();
        self.results = None;
    }

    pub fn results(&self) -> Option<&Projection> {
        self.results.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_field_parses_numeric_prefix_like_a_browser() {
        assert_eq!(coerce_field(FieldKind::Currency, "1500"), 1500.0);
        assert_eq!(coerce_field(FieldKind::Currency, "  12.5abc"), 12.5);
        assert_eq!(coerce_field(FieldKind::Currency, ".5"), 0.5);
        assert_eq!(coerce_field(FieldKind::Currency, "3."), 3.0);
        assert_eq!(coerce_field(FieldKind::Number, "-7"), -7.0);
        assert_eq!(coerce_field(FieldKind::Number, "1e3x"), 1000.0);
        assert_eq!(coerce_field(FieldKind::Number, "2e"), 2.0);
    }

    #[test]
    fn coerce_field_turns_garbage_into_zero() {
        for raw in ["", "abc", "-", ".", "e5", "NaN", "Infinity", "1e999"] {
            assert_eq!(coerce_field(FieldKind::Currency, raw), 0.0, "input {raw:?}");
        }
    }

    #[test]
    fn percentages_are_clamped() {
        assert_eq!(coerce_field(FieldKind::Percentage, "150"), 100.0);
        assert_eq!(coerce_field(FieldKind::Percentage, "-3"), 0.0);
        assert_eq!(coerce_field(FieldKind::Percentage, "7.25"), 7.25);
        assert_eq!(coerce_field(FieldKind::Percentage, "oops"), 0.0);
    }

    #[test]
    fn set_field_routes_by_kind() {
        let mut form = CalculatorForm::default();
        form.set_field(Field::RealInterestRate, "250");
        form.set_field(Field::InitialValue, "250");
        form.set_field(Field::YearsToRetirement, "12.9");

        assert_eq!(form.real_interest_rate, 100.0);
        assert_eq!(form.initial_value, 250.0);
        assert_eq!(form.to_input().horizon_years, 12);
    }

    #[test]
    fn fractional_contribution_year_is_never_applied() {
        let mut calculator = Calculator::new();
        calculator.form.set_field(Field::YearsToRetirement, "3");
        calculator.form.set_field(Field::RealInterestRate, "0");
        calculator.form.add_intermediate();
        calculator.form.update_intermediate(0, ContributionField::Year, "2.5");
        calculator.form.update_intermediate(0, ContributionField::Amount, "5000");

        assert_eq!(calculator.form.to_input().intermediate_contributions[0].year, 0);
        let projection = calculator.calculate();
        assert_eq!(projection.summary.total_contributed, 10_000.0 + 36_000.0);
        assert_eq!(projection.years[1].total_contributed, 10_000.0 + 24_000.0);
    }

    #[test]
    fn whole_contribution_year_with_decimal_point_still_applies() {
        let mut form = CalculatorForm::default();
        form.add_intermediate();
        form.update_intermediate(0, ContributionField::Year, "2.0");
        form.update_intermediate(0, ContributionField::Amount, "5000");
        assert_eq!(form.to_input().intermediate_contributions[0].year, 2);
    }

    #[test]
    fn huge_horizon_is_capped() {
        let mut form = CalculatorForm::default();
        form.set_field(Field::YearsToRetirement, "1e12");
        assert_eq!(form.to_input().horizon_years, MAX_HORIZON_YEARS);

        form.set_field(Field::YearsToRetirement, "999.9");
        assert_eq!(form.to_input().horizon_years, 999);
    }

    #[test]
    fn negative_horizon_becomes_empty_projection() {
        let mut calculator = Calculator::new();
        calculator.form.set_field(Field::YearsToRetirement, "-4");
        assert_eq!(calculator.form.to_input().horizon_years, 0);

        let projection = calculator.calculate();
        assert!(projection.years.is_empty());
        assert_eq!(projection.summary.final_nominal_value, DEFAULT_INITIAL_VALUE);
    }

    #[test]
    fn intermediate_rows_can_be_added_edited_and_removed() {
        let mut form = CalculatorForm::default();
        form.add_intermediate();
        form.add_intermediate();
        assert_eq!(
            form.intermediate_contributions,
            vec![
                IntermediateRow { year: 1.0, amount: 0.0 },
                IntermediateRow { year: 1.0, amount: 0.0 }
            ]
        );

        form.update_intermediate(0, ContributionField::Year, "5");
        form.update_intermediate(0, ContributionField::Amount, "20000");
        form.update_intermediate(1, ContributionField::Amount, "x");
        form.update_intermediate(9, ContributionField::Amount, "1");
        form.remove_intermediate(1);
        form.remove_intermediate(9);

        assert_eq!(
            form.to_input().intermediate_contributions,
            vec![IntermediateContribution {
                year: 5,
                amount: 20_000.0
            }]
        );
    }

    #[test]
    fn calculate_replaces_previous_results() {
        let mut calculator = Calculator::new();
        assert!(calculator.results().is_none());

        calculator.calculate();
        assert_eq!(calculator.results().map(|p| p.years.len()), Some(30));

        calculator.form.set_field(Field::YearsToRetirement, "3");
        calculator.calculate();
        assert_eq!(calculator.results().map(|p| p.years.len()), Some(3));
    }

    #[test]
    fn reset_restores_defaults_and_clears_results() {
        let mut calculator = Calculator::new();
        calculator.form.set_field(Field::InitialValue, "1");
        calculator.form.set_field(Field::MonthlyContribution, "2");
        calculator.form.set_field(Field::RealInterestRate, "3");
        calculator.form.set_field(Field::InflationRate, "4.5");
        calculator.form.set_field(Field::YearsToRetirement, "5");
        calculator.form.add_intermediate();
        calculator.form.update_intermediate(0, ContributionField::Amount, "900");
        calculator.calculate();
        assert!(calculator.results().is_some());

        calculator.reset();

        let form = &calculator.form;
        assert_eq!(form.initial_value, 10_000.0);
        assert_eq!(form.monthly_contribution, 1_000.0);
        assert_eq!(form.real_interest_rate, 10.0);
        assert_eq!(form.inflation_rate, 4.0);
        assert_eq!(form.years_to_retirement, 30.0);
        assert!(form.intermediate_contributions.is_empty());
        assert!(calculator.results().is_none());
    }
}
