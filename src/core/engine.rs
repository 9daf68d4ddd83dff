use std::collections::HashMap;

use super::types::{
    MONTHS_PER_YEAR, Projection, ProjectionInput, ProjectionSummary, SAFE_WITHDRAWAL_RATE,
    YearSnapshot,
};

/// Runs the deterministic compound-growth projection.
///
/// Each year first applies that year's lump sum (if any), then twelve months
/// of `value * (1 + r) + contribution`, and finally deflates the nominal value
/// by annually compounded inflation up to that year. The evaluation order is
/// sequential on purpose; closed-form annuity formulas drift at the precision
/// callers compare against.
pub fn project(input: &ProjectionInput) -> Projection {
    let monthly_rate = input.real_interest_rate_percent / 100.0 / 12.0;
    let lump_sums = lump_sum_schedule(input);

    let mut current_value = input.initial_value;
    let mut total_contributed = input.initial_value;
    let mut years = Vec::new();

    for year in 1..=input.horizon_years {
        if let Some(&amount) = lump_sums.get(&year) {
            current_value += amount;
            total_contributed += amount;
        }

        for _ in 0..MONTHS_PER_YEAR {
            current_value = current_value * (1.0 + monthly_rate) + input.monthly_contribution;
            total_contributed += input.monthly_contribution;
        }

        years.push(YearSnapshot {
            year,
            nominal_value: current_value,
            real_value: deflate(current_value, input.inflation_rate_percent, year),
            total_contributed,
            gains: current_value - total_contributed,
        });
    }

    let final_real_value = deflate(
        current_value,
        input.inflation_rate_percent,
        input.horizon_years,
    );

    Projection {
        years,
        summary: ProjectionSummary {
            final_nominal_value: current_value,
            final_real_value,
            total_contributed,
            total_gains: current_value - total_contributed,
            monthly_retirement_income: final_real_value * SAFE_WITHDRAWAL_RATE / 12.0,
        },
    }
}

/// Year -> amount for every usable intermediate contribution. A year listed
/// more than once keeps the last amount seen, it does not accumulate.
fn lump_sum_schedule(input: &ProjectionInput) -> HashMap<u32, f64> {
    let mut schedule = HashMap::new();
    for contribution in &input.intermediate_contributions {
        if contribution.year <= input.horizon_years && contribution.amount > 0.0 {
            schedule.insert(contribution.year, contribution.amount);
        }
    }
    schedule
}

/// Converts a nominal amount `years` years out back to year-0 purchasing power.
pub fn deflate(nominal: f64, inflation_rate_percent: f64, years: u32) -> f64 {
    nominal / (1.0 + inflation_rate_percent / 100.0).powf(f64::from(years))
}
