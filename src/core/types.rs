use serde::Serialize;

use super::error::{CalcError, CalcResult, ensure_finite, ensure_range};

pub const LIFE_EXPECTANCY_AGE: u32 = 85;
pub const MAX_LOAN_RATE: f64 = 0.50;
pub const MAX_LOAN_TENURE_MONTHS: u32 = 480;
pub const MAX_PROJECTION_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionMode {
    Monthly,
    Yearly,
}

// Deposits stop after `contribution_periods`; the balance compounds to `periods`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionPlan {
    pub amount: f64,
    pub rate: f64,
    pub periods: u32,
    pub contribution_periods: u32,
    pub mode: ContributionMode,
}

impl ContributionPlan {
    pub fn new(amount: f64, rate: f64, periods: u32, mode: ContributionMode) -> CalcResult<Self> {
        Self::with_contribution_periods(amount, rate, periods, periods, mode)
    }

    pub fn with_contribution_periods(
        amount: f64,
        rate: f64,
        periods: u32,
        contribution_periods: u32,
        mode: ContributionMode,
    ) -> CalcResult<Self> {
        ensure_finite("amount", amount)?;
        if amount < 0.0 {
            return Err(CalcError::invalid("amount", "must be >= 0"));
        }
        ensure_range("rate", rate, 0.0, 1.0)?;
        if periods == 0 || periods > MAX_PROJECTION_YEARS {
            return Err(CalcError::invalid(
                "periods",
                format!("must be between 1 and {MAX_PROJECTION_YEARS} years"),
            ));
        }
        if contribution_periods > periods {
            return Err(CalcError::invalid(
                "contributionPeriods",
                "cannot exceed the total tenure",
            ));
        }
        Ok(Self {
            amount,
            rate,
            periods,
            contribution_periods,
            mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyLedgerRow {
    pub year: u32,
    pub opening_balance: f64,
    pub contribution: f64,
    pub interest: f64,
    pub closing_balance: f64,
    pub cumulative_investment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthProjection {
    pub rows: Vec<YearlyLedgerRow>,
    pub maturity_value: f64,
    pub total_investment: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prepayment {
    pub amount: f64,
    pub at_month: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_months: u32,
    pub prepayment: Option<Prepayment>,
}

impl LoanTerms {
    pub fn new(
        principal: f64,
        annual_rate: f64,
        tenure_months: u32,
        prepayment: Option<Prepayment>,
    ) -> CalcResult<Self> {
        ensure_finite("principal", principal)?;
        if principal <= 0.0 {
            return Err(CalcError::invalid("principal", "must be > 0"));
        }
        ensure_finite("rate", annual_rate)?;
        if annual_rate <= 0.0 || annual_rate > MAX_LOAN_RATE {
            return Err(CalcError::invalid(
                "rate",
                format!("must be > 0 and <= {}", MAX_LOAN_RATE * 100.0),
            ));
        }
        if tenure_months == 0 || tenure_months > MAX_LOAN_TENURE_MONTHS {
            return Err(CalcError::invalid(
                "tenure",
                format!("must be between 1 and {MAX_LOAN_TENURE_MONTHS} months"),
            ));
        }
        if let Some(prepay) = prepayment {
            ensure_finite("prepaymentAmount", prepay.amount)?;
            if prepay.amount <= 0.0 {
                return Err(CalcError::invalid("prepaymentAmount", "must be > 0"));
            }
            if prepay.at_month == 0 || prepay.at_month > tenure_months {
                return Err(CalcError::invalid(
                    "prepaymentMonth",
                    "must fall within the loan tenure",
                ));
            }
        }
        Ok(Self {
            principal,
            annual_rate,
            tenure_months,
            prepayment,
        })
    }

    pub fn without_prepayment(&self) -> Self {
        Self {
            prepayment: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: u32,
    pub principal_paid: f64,
    pub prepayment: f64,
    pub interest_paid: f64,
    pub total_payment: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub emi: f64,
    pub rows: Vec<AmortizationRow>,
    pub total_interest: f64,
    pub total_paid: f64,
    pub months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepaymentComparison {
    pub baseline: AmortizationSchedule,
    pub with_prepayment: Option<AmortizationSchedule>,
    pub interest_saved: f64,
    pub months_saved: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBand {
    Below60,
    Senior,
    SuperSenior,
}

impl AgeBand {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=59 => AgeBand::Below60,
            60..=79 => AgeBand::Senior,
            _ => AgeBand::SuperSenior,
        }
    }

    pub fn is_senior(self) -> bool {
        !matches!(self, AgeBand::Below60)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deductions {
    pub section_80c: f64,
    pub section_80d: f64,
    pub section_80ccd_1b: f64,
    pub section_80tta: f64,
    pub home_loan_interest: f64,
    pub lta: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HraDetails {
    pub basic_salary: f64,
    pub hra_received: f64,
    pub rent_paid: f64,
    pub metro: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxScenario {
    pub gross_salary: f64,
    pub other_income: f64,
    pub age_band: AgeBand,
    pub deductions: Deductions,
    pub hra: HraDetails,
}

impl TaxScenario {
    pub fn new(
        gross_salary: f64,
        other_income: f64,
        age_band: AgeBand,
        deductions: Deductions,
        hra: HraDetails,
    ) -> CalcResult<Self> {
        for (field, value) in [
            ("grossSalary", gross_salary),
            ("otherIncome", other_income),
            ("section80c", deductions.section_80c),
            ("section80d", deductions.section_80d),
            ("section80ccd1b", deductions.section_80ccd_1b),
            ("section80tta", deductions.section_80tta),
            ("homeLoanInterest", deductions.home_loan_interest),
            ("lta", deductions.lta),
            ("basicSalary", hra.basic_salary),
            ("hraReceived", hra.hra_received),
            ("rentPaid", hra.rent_paid),
        ] {
            ensure_finite(field, value)?;
            if value < 0.0 {
                return Err(CalcError::invalid(field, "must be >= 0"));
            }
        }
        if hra.basic_salary > gross_salary {
            return Err(CalcError::invalid(
                "basicSalary",
                "cannot exceed gross salary",
            ));
        }
        Ok(Self {
            gross_salary,
            other_income,
            age_band,
            deductions,
            hra,
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Old,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub regime: Regime,
    pub taxable_income: f64,
    pub total_deductions: f64,
    pub tax_before_rebate: f64,
    pub rebate: f64,
    pub cess: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxComparison {
    pub hra_exemption: f64,
    pub old_regime: TaxResult,
    pub new_regime: TaxResult,
    pub better_regime: Regime,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetirementPlan {
    pub current_age: u32,
    pub retire_age: u32,
    pub monthly_expense: f64,
    pub current_savings: f64,
    pub inflation_rate: f64,
    pub pre_return: f64,
    pub post_return: f64,
}

impl RetirementPlan {
    pub fn new(
        current_age: u32,
        retire_age: u32,
        monthly_expense: f64,
        current_savings: f64,
        inflation_rate: f64,
        pre_return: f64,
        post_return: f64,
    ) -> CalcResult<Self> {
        if retire_age <= current_age {
            return Err(CalcError::invalid("retireAge", "must be > currentAge"));
        }
        if retire_age >= LIFE_EXPECTANCY_AGE {
            return Err(CalcError::invalid(
                "retireAge",
                format!("must be < {LIFE_EXPECTANCY_AGE}"),
            ));
        }
        ensure_finite("monthlyExpense", monthly_expense)?;
        if monthly_expense <= 0.0 {
            return Err(CalcError::invalid("monthlyExpense", "must be > 0"));
        }
        ensure_finite("currentSavings", current_savings)?;
        if current_savings < 0.0 {
            return Err(CalcError::invalid("currentSavings", "must be >= 0"));
        }
        ensure_range("inflationRate", inflation_rate, 0.0, 0.5)?;
        ensure_range("preReturn", pre_return, 0.0, 0.5)?;
        ensure_range("postReturn", post_return, 0.0, 0.5)?;
        Ok(Self {
            current_age,
            retire_age,
            monthly_expense,
            current_savings,
            inflation_rate,
            pre_return,
            post_return,
        })
    }

    pub fn years_to_retirement(&self) -> u32 {
        self.retire_age - self.current_age
    }

    pub fn retirement_years(&self) -> u32 {
        LIFE_EXPECTANCY_AGE - self.retire_age
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementYear {
    pub year: u32,
    pub age: u32,
    pub savings_value: f64,
    pub sip_invested: f64,
    pub sip_value: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementResult {
    pub years_to_retirement: u32,
    pub retirement_years: u32,
    pub future_monthly_expense: f64,
    pub future_annual_expense: f64,
    pub required_corpus: f64,
    pub projected_savings: f64,
    pub shortfall: f64,
    pub monthly_sip: f64,
    pub projection: Vec<RetirementYear>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundHolding {
    pub symbol: String,
    pub name: String,
    pub weight_percent: f64,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub name: String,
    pub holdings: Vec<FundHolding>,
}

impl Fund {
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight_percent).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwiseOverlap {
    pub first: String,
    pub second: String,
    pub overlap_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonHolding {
    pub symbol: String,
    pub name: String,
    pub min_weight: f64,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorOverlap {
    pub sector: String,
    pub min_weight: f64,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapReport {
    pub fund_names: Vec<String>,
    pub weighted_overlap: f64,
    pub pairwise: Vec<PairwiseOverlap>,
    pub sectors: Vec<SectorOverlap>,
    pub sector_overlap: f64,
    pub common_holdings: Vec<CommonHolding>,
}
