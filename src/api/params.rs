use clap::Args;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::core::{
    AgeBand, ApyResult, CalcError, CalcResult, Deductions, FdVsPpfInput, FdVsPpfResult, Fund,
    GrowthProjection, HraDetails, LoanTerms, NpsInput, NpsResult, OverlapReport, PpfInput,
    Prepayment, PrepaymentComparison, RetirementPlan, RetirementResult, SsyInput, SsyResult,
    TaxComparison, TaxRules, TaxScenario, apy, compare_prepayment, compare_regimes,
    compute_overlap, fd_vs_ppf, nps, ppf, size_retirement, ssy,
};
use crate::export::{amortization_csv, growth_csv, retirement_csv};

/// One calculator reachable from a route and a CLI subcommand.
pub trait Calculator: DeserializeOwned + Send + 'static {
    type Output: Serialize;

    const NAME: &'static str;

    fn run(self, rules: &TaxRules) -> CalcResult<Self::Output>;

    fn csv(_output: &Self::Output) -> Option<CalcResult<String>> {
        None
    }
}

fn percent(field: &str, value: f64) -> CalcResult<f64> {
    if !value.is_finite() {
        return Err(CalcError::invalid(field, "must be a finite number"));
    }
    Ok(value / 100.0)
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct PpfParams {
    #[arg(long, help = "Yearly deposit, 500 to 150000")]
    pub amount: Option<f64>,
    #[arg(long, help = "Tenure in years, at least 15")]
    pub tenure: Option<u32>,
    #[arg(long, help = "Interest rate in percent, e.g. 7.1")]
    pub rate: Option<f64>,
}

impl Calculator for PpfParams {
    type Output = GrowthProjection;

    const NAME: &'static str = "ppf";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        ppf(&PpfInput {
            annual_investment: self.amount.unwrap_or(150_000.0),
            tenure_years: self.tenure.unwrap_or(15),
            rate: percent("rate", self.rate.unwrap_or(7.1))?,
        })
    }

    fn csv(output: &Self::Output) -> Option<CalcResult<String>> {
        Some(growth_csv(output))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct SsyParams {
    #[arg(long, help = "Yearly deposit, 250 to 150000")]
    pub amount: Option<f64>,
    #[arg(long, help = "Girl's age at account opening, up to 10")]
    pub girl_age: Option<u32>,
    #[arg(long, help = "Interest rate in percent, e.g. 8.2")]
    pub rate: Option<f64>,
}

impl Calculator for SsyParams {
    type Output = SsyResult;

    const NAME: &'static str = "ssy";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        ssy(&SsyInput {
            annual_investment: self.amount.unwrap_or(150_000.0),
            girl_age: self.girl_age.unwrap_or(5),
            rate: percent("rate", self.rate.unwrap_or(8.2))?,
        })
    }

    fn csv(output: &Self::Output) -> Option<CalcResult<String>> {
        Some(growth_csv(&output.projection))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct NpsParams {
    #[arg(long, help = "Monthly contribution")]
    pub monthly_contribution: Option<f64>,
    #[arg(long)]
    pub current_age: Option<u32>,
    #[arg(long, help = "Expected annual return in percent")]
    pub rate: Option<f64>,
    #[arg(long, help = "Share of the corpus used to buy an annuity, percent (min 40)")]
    pub annuity_share: Option<f64>,
    #[arg(long, help = "Annuity rate in percent")]
    pub annuity_rate: Option<f64>,
}

impl Calculator for NpsParams {
    type Output = NpsResult;

    const NAME: &'static str = "nps";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        nps(&NpsInput {
            monthly_contribution: self.monthly_contribution.unwrap_or(5_000.0),
            current_age: self.current_age.unwrap_or(30),
            expected_return: percent("rate", self.rate.unwrap_or(10.0))?,
            annuity_share: percent("annuityShare", self.annuity_share.unwrap_or(40.0))?,
            annuity_rate: percent("annuityRate", self.annuity_rate.unwrap_or(6.0))?,
        })
    }

    fn csv(output: &Self::Output) -> Option<CalcResult<String>> {
        Some(growth_csv(&output.projection))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct FdVsPpfParams {
    #[arg(long, help = "Yearly deposit into each option")]
    pub amount: Option<f64>,
    #[arg(long, help = "Tenure in years")]
    pub tenure: Option<u32>,
    #[arg(long, help = "PPF rate in percent")]
    pub ppf_rate: Option<f64>,
    #[arg(long, help = "FD rate in percent, compounded quarterly")]
    pub fd_rate: Option<f64>,
    #[arg(long, help = "Marginal tax slab in percent applied to FD interest")]
    pub tax_slab: Option<f64>,
}

impl Calculator for FdVsPpfParams {
    type Output = FdVsPpfResult;

    const NAME: &'static str = "fd-vs-ppf";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        fd_vs_ppf(&FdVsPpfInput {
            annual_investment: self.amount.unwrap_or(150_000.0),
            tenure_years: self.tenure.unwrap_or(15),
            ppf_rate: percent("ppfRate", self.ppf_rate.unwrap_or(7.1))?,
            fd_rate: percent("fdRate", self.fd_rate.unwrap_or(7.0))?,
            tax_slab_rate: percent("taxSlab", self.tax_slab.unwrap_or(30.0))?,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct ApyParams {
    #[arg(long, help = "Entry age, 18 to 39")]
    pub age: Option<u32>,
    #[arg(long, help = "Guaranteed monthly pension: 1000, 2000, 3000, 4000 or 5000")]
    pub pension: Option<u32>,
}

impl Calculator for ApyParams {
    type Output = ApyResult;

    const NAME: &'static str = "apy";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        apy(self.age.unwrap_or(25), self.pension.unwrap_or(5_000))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanParams {
    #[arg(long, help = "Loan principal")]
    pub principal: Option<f64>,
    #[arg(long, help = "Annual interest rate in percent")]
    pub rate: Option<f64>,
    #[arg(long, help = "Tenure in years")]
    pub tenure: Option<u32>,
    #[arg(long, help = "One-time prepayment amount")]
    pub prepayment_amount: Option<f64>,
    #[arg(long, help = "Month in which the prepayment is made")]
    pub prepayment_month: Option<u32>,
}

impl LoanParams {
    fn terms(&self) -> CalcResult<LoanTerms> {
        let prepayment = match (self.prepayment_amount, self.prepayment_month) {
            (None, None) => None,
            (Some(amount), _) if amount == 0.0 => None,
            (Some(amount), Some(at_month)) => Some(Prepayment { amount, at_month }),
            (Some(_), None) => {
                return Err(CalcError::invalid(
                    "prepaymentMonth",
                    "is required with a prepayment amount",
                ));
            }
            (None, Some(_)) => {
                return Err(CalcError::invalid(
                    "prepaymentAmount",
                    "is required with a prepayment month",
                ));
            }
        };
        let months = self
            .tenure
            .unwrap_or(10)
            .checked_mul(12)
            .ok_or_else(|| CalcError::invalid("tenure", "is too large"))?;
        LoanTerms::new(
            self.principal.unwrap_or(1_000_000.0),
            percent("rate", self.rate.unwrap_or(8.5))?,
            months,
            prepayment,
        )
    }
}

impl Calculator for LoanParams {
    type Output = PrepaymentComparison;

    const NAME: &'static str = "loan";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        Ok(compare_prepayment(&self.terms()?))
    }

    fn csv(output: &Self::Output) -> Option<CalcResult<String>> {
        let schedule = output.with_prepayment.as_ref().unwrap_or(&output.baseline);
        Some(amortization_csv(schedule))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxParams {
    #[arg(long)]
    pub gross_salary: Option<f64>,
    #[arg(long)]
    pub other_income: Option<f64>,
    #[arg(long, help = "Taxpayer age; selects the old-regime slab table")]
    pub age: Option<u32>,
    #[arg(long)]
    pub section_80c: Option<f64>,
    #[arg(long)]
    pub section_80d: Option<f64>,
    #[arg(long)]
    pub section_80ccd_1b: Option<f64>,
    #[arg(long)]
    pub section_80tta: Option<f64>,
    #[arg(long)]
    pub home_loan_interest: Option<f64>,
    #[arg(long)]
    pub lta: Option<f64>,
    #[arg(long)]
    pub basic_salary: Option<f64>,
    #[arg(long)]
    pub hra_received: Option<f64>,
    #[arg(long)]
    pub rent_paid: Option<f64>,
    #[arg(long, help = "Rent is paid in a metro city (50% HRA limit)")]
    pub metro: Option<bool>,
}

impl Calculator for TaxParams {
    type Output = TaxComparison;

    const NAME: &'static str = "tax";

    fn run(self, rules: &TaxRules) -> CalcResult<Self::Output> {
        let scenario = TaxScenario::new(
            self.gross_salary.unwrap_or(1_200_000.0),
            self.other_income.unwrap_or(0.0),
            AgeBand::from_age(self.age.unwrap_or(30)),
            Deductions {
                section_80c: self.section_80c.unwrap_or(0.0),
                section_80d: self.section_80d.unwrap_or(0.0),
                section_80ccd_1b: self.section_80ccd_1b.unwrap_or(0.0),
                section_80tta: self.section_80tta.unwrap_or(0.0),
                home_loan_interest: self.home_loan_interest.unwrap_or(0.0),
                lta: self.lta.unwrap_or(0.0),
            },
            HraDetails {
                basic_salary: self.basic_salary.unwrap_or(0.0),
                hra_received: self.hra_received.unwrap_or(0.0),
                rent_paid: self.rent_paid.unwrap_or(0.0),
                metro: self.metro.unwrap_or(false),
            },
        )?;
        Ok(compare_regimes(&scenario, rules))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct RetirementParams {
    #[arg(long)]
    pub current_age: Option<u32>,
    #[arg(long)]
    pub retire_age: Option<u32>,
    #[arg(long, help = "Current monthly expenses")]
    pub monthly_expense: Option<f64>,
    #[arg(long)]
    pub current_savings: Option<f64>,
    #[arg(long, help = "Expected inflation in percent")]
    pub inflation: Option<f64>,
    #[arg(long, help = "Pre-retirement return in percent")]
    pub pre_return: Option<f64>,
    #[arg(long, help = "Post-retirement return in percent")]
    pub post_return: Option<f64>,
}

impl Calculator for RetirementParams {
    type Output = RetirementResult;

    const NAME: &'static str = "retirement";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        let plan = RetirementPlan::new(
            self.current_age.unwrap_or(30),
            self.retire_age.unwrap_or(60),
            self.monthly_expense.unwrap_or(50_000.0),
            self.current_savings.unwrap_or(500_000.0),
            percent("inflation", self.inflation.unwrap_or(6.0))?,
            percent("preReturn", self.pre_return.unwrap_or(12.0))?,
            percent("postReturn", self.post_return.unwrap_or(8.0))?,
        )?;
        Ok(size_retirement(&plan))
    }

    fn csv(output: &Self::Output) -> Option<CalcResult<String>> {
        Some(retirement_csv(output))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FundText {
    pub name: String,
    pub holdings: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OverlapPayload {
    pub funds: Vec<FundText>,
}

impl Calculator for OverlapPayload {
    type Output = OverlapReport;

    const NAME: &'static str = "overlap";

    fn run(self, _rules: &TaxRules) -> CalcResult<Self::Output> {
        let funds: Vec<Fund> = self
            .funds
            .into_iter()
            .map(|f| Fund::parse(f.name, &f.holdings))
            .collect();
        compute_overlap(&funds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TaxRules {
        TaxRules::fy2023_24().expect("default rules are valid")
    }

    #[test]
    fn ppf_defaults_reproduce_reference_case() {
        let out = PpfParams::default().run(&rules()).expect("valid defaults");
        assert!((out.maturity_value - 4_068_209.22).abs() < 0.01);
        assert_eq!(out.total_investment, 2_250_000.0);
    }

    #[test]
    fn every_calculator_accepts_its_defaults() {
        let rules = rules();
        assert!(SsyParams::default().run(&rules).is_ok());
        assert!(NpsParams::default().run(&rules).is_ok());
        assert!(FdVsPpfParams::default().run(&rules).is_ok());
        assert!(ApyParams::default().run(&rules).is_ok());
        assert!(LoanParams::default().run(&rules).is_ok());
        assert!(TaxParams::default().run(&rules).is_ok());
        assert!(RetirementParams::default().run(&rules).is_ok());
    }

    #[test]
    fn loan_params_convert_years_and_percent() {
        let params: LoanParams = serde_json::from_str(
            r#"{"principal":500000,"rate":9,"tenure":5,"prepaymentAmount":100000,"prepaymentMonth":12}"#,
        )
        .expect("valid json");
        let terms = params.terms().expect("valid terms");
        assert_eq!(terms.tenure_months, 60);
        assert!((terms.annual_rate - 0.09).abs() < 1e-12);
        assert_eq!(
            terms.prepayment,
            Some(Prepayment {
                amount: 100_000.0,
                at_month: 12
            })
        );
    }

    #[test]
    fn loan_params_require_both_prepayment_fields() {
        let params = LoanParams {
            prepayment_amount: Some(50_000.0),
            ..LoanParams::default()
        };
        let err = params.terms().expect_err("must reject");
        assert!(err.to_string().contains("prepaymentMonth"));

        let zero = LoanParams {
            prepayment_amount: Some(0.0),
            ..LoanParams::default()
        };
        assert_eq!(zero.terms().expect("valid").prepayment, None);
    }

    #[test]
    fn huge_tenures_are_rejected_before_any_projection() {
        let loan = LoanParams {
            tenure: Some(u32::MAX),
            ..LoanParams::default()
        };
        assert!(loan.run(&rules()).is_err());

        let loan = LoanParams {
            tenure: Some(41),
            ..LoanParams::default()
        };
        assert!(loan.run(&rules()).is_err());

        let fd = FdVsPpfParams {
            tenure: Some(u32::MAX),
            ..FdVsPpfParams::default()
        };
        assert!(fd.run(&rules()).is_err());
    }

    #[test]
    fn tax_params_parse_section_keys() {
        let params: TaxParams = serde_json::from_str(
            r#"{"grossSalary":1500000,"section80c":150000,"section80ccd1b":50000,"age":65,"metro":true}"#,
        )
        .expect("valid json");
        assert_eq!(params.section_80c, Some(150_000.0));
        assert_eq!(params.section_80ccd_1b, Some(50_000.0));
        let out = params.run(&rules()).expect("valid scenario");
        assert!(out.old_regime.total_deductions >= 250_000.0);
    }

    #[test]
    fn non_finite_rates_are_rejected() {
        let params = PpfParams {
            rate: Some(f64::NAN),
            ..PpfParams::default()
        };
        assert!(params.run(&rules()).is_err());
    }

    #[test]
    fn overlap_payload_builds_funds() {
        let payload: OverlapPayload = serde_json::from_str(
            r#"{"funds":[{"name":"A","holdings":"X,x,5\nY,y,5"},{"name":"B","holdings":"X,x,3"}]}"#,
        )
        .expect("valid json");
        let report = payload.run(&rules()).expect("valid overlap");
        assert_eq!(report.weighted_overlap, 3.0);
    }
}
