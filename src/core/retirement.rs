use super::types::{RetirementPlan, RetirementResult, RetirementYear};

/// Present value at retirement of an inflation-indexed expense stream paid
/// at the start of each year, discounted at the real post-retirement return.
pub fn required_corpus(annual_expense: f64, years: u32, post_return: f64, inflation: f64) -> f64 {
    let n = years as f64;
    if post_return == inflation {
        return annual_expense * n;
    }
    let real = (1.0 + post_return) / (1.0 + inflation) - 1.0;
    annual_expense * (1.0 - (1.0 + real).powf(-n)) / real * (1.0 + real)
}

/// Level monthly SIP that grows to `target` in `months` at `annual_rate`.
pub fn monthly_sip_for(target: f64, annual_rate: f64, months: u32) -> f64 {
    if target <= 0.0 || months == 0 {
        return 0.0;
    }
    let i = annual_rate / 12.0;
    let m = months as f64;
    if i == 0.0 {
        return target / m;
    }
    target * i / ((1.0 + i).powf(m) - 1.0)
}

fn sip_future_value(sip: f64, annual_rate: f64, months: u32) -> f64 {
    let i = annual_rate / 12.0;
    let m = months as f64;
    if i == 0.0 {
        return sip * m;
    }
    sip * ((1.0 + i).powf(m) - 1.0) / i
}

pub fn size_retirement(plan: &RetirementPlan) -> RetirementResult {
    let years = plan.years_to_retirement();
    let retirement_years = plan.retirement_years();

    let future_monthly_expense =
        plan.monthly_expense * (1.0 + plan.inflation_rate).powi(years as i32);
    let future_annual_expense = future_monthly_expense * 12.0;
    let corpus = required_corpus(
        future_annual_expense,
        retirement_years,
        plan.post_return,
        plan.inflation_rate,
    );

    let projected_savings = plan.current_savings * (1.0 + plan.pre_return).powi(years as i32);
    let shortfall = (corpus - projected_savings).max(0.0);
    let monthly_sip = monthly_sip_for(shortfall, plan.pre_return, years * 12);

    let projection = (1..=years)
        .map(|year| {
            let savings_value = plan.current_savings * (1.0 + plan.pre_return).powi(year as i32);
            let sip_value = sip_future_value(monthly_sip, plan.pre_return, year * 12);
            RetirementYear {
                year,
                age: plan.current_age + year,
                savings_value,
                sip_invested: monthly_sip * 12.0 * year as f64,
                sip_value,
                total_value: savings_value + sip_value,
            }
        })
        .collect();

    RetirementResult {
        years_to_retirement: years,
        retirement_years,
        future_monthly_expense,
        future_annual_expense,
        required_corpus: corpus,
        projected_savings,
        shortfall,
        monthly_sip,
        projection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_plan() -> RetirementPlan {
        RetirementPlan::new(30, 60, 50_000.0, 500_000.0, 0.06, 0.12, 0.08).expect("valid plan")
    }

    #[test]
    fn corpus_is_linear_when_real_return_is_zero() {
        let plan =
            RetirementPlan::new(35, 60, 40_000.0, 0.0, 0.06, 0.10, 0.06).expect("valid plan");
        let result = size_retirement(&plan);
        assert_eq!(result.retirement_years, 25);
        assert_eq!(
            result.required_corpus,
            result.future_annual_expense * 25.0
        );
    }

    #[test]
    fn sample_plan_closes_the_gap_at_retirement() {
        let result = size_retirement(&sample_plan());
        assert_eq!(result.years_to_retirement, 30);
        assert_eq!(result.projection.len(), 30);
        assert_approx_tol(
            result.future_monthly_expense,
            50_000.0 * 1.06f64.powi(30),
            1e-6,
        );
        let last = result.projection.last().expect("rows");
        assert_eq!(last.age, 60);
        assert_approx_tol(last.total_value, result.required_corpus, 1e-3);
    }

    #[test]
    fn no_sip_needed_when_savings_already_cover_corpus() {
        let plan =
            RetirementPlan::new(50, 55, 10_000.0, 50_000_000.0, 0.05, 0.10, 0.07)
                .expect("valid plan");
        let result = size_retirement(&plan);
        assert_eq!(result.shortfall, 0.0);
        assert_eq!(result.monthly_sip, 0.0);
    }

    #[test]
    fn zero_pre_return_falls_back_to_linear_sip() {
        assert_approx_tol(monthly_sip_for(120_000.0, 0.0, 12), 10_000.0, 1e-9);
    }

    #[test]
    fn plan_rejects_retirement_before_current_age() {
        assert!(RetirementPlan::new(40, 40, 1.0, 0.0, 0.06, 0.1, 0.08).is_err());
        assert!(RetirementPlan::new(40, 85, 1.0, 0.0, 0.06, 0.1, 0.08).is_err());
        assert!(RetirementPlan::new(40, 60, 0.0, 0.0, 0.06, 0.1, 0.08).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_degenerate_rate_gives_exact_linear_corpus(
            expense in 1_000u32..10_000_000,
            years in 1u32..60,
            rate_bp in 0u32..1500,
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let corpus = required_corpus(expense as f64, years, rate, rate);
            prop_assert!(corpus == expense as f64 * years as f64);
        }

        #[test]
        fn prop_higher_real_return_needs_smaller_corpus(
            expense in 1_000u32..1_000_000,
            years in 1u32..50,
            post_bp in 0u32..1500,
            bump_bp in 1u32..500,
        ) {
            let inflation = 0.06;
            let low = required_corpus(expense as f64, years, post_bp as f64 / 10_000.0, inflation);
            let high = required_corpus(
                expense as f64,
                years,
                (post_bp + bump_bp) as f64 / 10_000.0,
                inflation,
            );
            prop_assert!(high <= low + 1e-6 * low);
        }
    }
}
