use super::types::{ContributionMode, ContributionPlan, GrowthProjection, YearlyLedgerRow};

const MONTHS_PER_YEAR: u32 = 12;

/// Yearly mode deposits at the start of the year. Monthly mode deposits and
/// compounds each month; the row aggregates the twelve months.
pub fn project_growth(plan: &ContributionPlan) -> GrowthProjection {
    let mut rows = Vec::with_capacity(plan.periods as usize);
    let mut balance = 0.0;
    let mut invested = 0.0;

    for year in 1..=plan.periods {
        let contributing = year <= plan.contribution_periods;
        let opening = balance;
        let (contribution, interest) = match plan.mode {
            ContributionMode::Yearly => yearly_step(plan, opening, contributing),
            ContributionMode::Monthly => monthly_step(plan, opening, contributing),
        };
        balance = opening + contribution + interest;
        invested += contribution;
        rows.push(YearlyLedgerRow {
            year,
            opening_balance: opening,
            contribution,
            interest,
            closing_balance: balance,
            cumulative_investment: invested,
        });
    }

    GrowthProjection {
        rows,
        maturity_value: balance,
        total_investment: invested,
        total_interest: balance - invested,
    }
}

fn yearly_step(plan: &ContributionPlan, opening: f64, contributing: bool) -> (f64, f64) {
    let contribution = if contributing { plan.amount } else { 0.0 };
    (contribution, (opening + contribution) * plan.rate)
}

fn monthly_step(plan: &ContributionPlan, opening: f64, contributing: bool) -> (f64, f64) {
    let monthly_rate = plan.rate / MONTHS_PER_YEAR as f64;
    let deposit = if contributing { plan.amount } else { 0.0 };
    let mut balance = opening;
    let mut contribution = 0.0;
    let mut interest = 0.0;
    for _ in 0..MONTHS_PER_YEAR {
        balance += deposit;
        contribution += deposit;
        let earned = balance * monthly_rate;
        balance += earned;
        interest += earned;
    }
    (contribution, interest)
}

pub fn compound(principal: f64, annual_rate: f64, periods_per_year: u32, years: f64) -> f64 {
    let n = periods_per_year as f64;
    principal * (1.0 + annual_rate / n).powf(n * years)
}
