use serde::Serialize;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Annual share of the real pot assumed sustainable in retirement (the "4% rule").
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateContribution {
    pub year: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInput {
    pub initial_value: f64,
    pub monthly_contribution: f64,
    /// Annual real rate in percent, e.g. 10 for 10%.
    #[serde(rename = "realInterestRate")]
    pub real_interest_rate_percent: f64,
    /// Annual inflation in percent.
    #[serde(rename = "inflationRate")]
    pub inflation_rate_percent: f64,
    #[serde(rename = "yearsToRetirement")]
    pub horizon_years: u32,
    pub intermediate_contributions: Vec<IntermediateContribution>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub year: u32,
    pub nominal_value: f64,
    pub real_value: f64,
    pub total_contributed: f64,
    pub gains: f64,
}

impl YearSnapshot {
    /// Gains as a percentage of everything paid in so far. `None` while nothing
    /// has been contributed.
    pub fn return_percentage(&self) -> Option<f64> {
        if self.total_contributed == 0.0 {
            None
        } else {
            Some(self.gains / self.total_contributed * 100.0)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_nominal_value: f64,
    pub final_real_value: f64,
    pub total_contributed: f64,
    pub total_gains: f64,
    pub monthly_retirement_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub years: Vec<YearSnapshot>,
    pub summary: ProjectionSummary,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub year: u32,
    pub nominal_value: f64,
    pub real_value: f64,
    pub total_contributed: f64,
    pub gains: f64,
    pub return_percentage: Option<f64>,
}

impl From<&YearSnapshot> for ChartRow {
    fn from(snapshot: &YearSnapshot) -> Self {
        Self {
            year: snapshot.year,
            nominal_value: snapshot.nominal_value,
            real_value: snapshot.real_value,
            total_contributed: snapshot.total_contributed,
            gains: snapshot.gains,
            return_percentage: snapshot.return_percentage(),
        }
    }
}

impl Projection {
    pub fn chart_rows(&self) -> Vec<ChartRow> {
        self.years.iter().map(ChartRow::from).collect()
    }
}
