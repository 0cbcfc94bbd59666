use serde::Serialize;

use super::error::{CalcError, CalcResult, ensure_range};
use super::growth::{compound, project_growth};
use super::types::{ContributionMode, ContributionPlan, GrowthProjection};

pub const PPF_MIN_DEPOSIT: f64 = 500.0;
pub const PPF_MAX_DEPOSIT: f64 = 150_000.0;
pub const PPF_MIN_TENURE: u32 = 15;
pub const PPF_MAX_TENURE: u32 = 50;

pub const SSY_MIN_DEPOSIT: f64 = 250.0;
pub const SSY_MAX_DEPOSIT: f64 = 150_000.0;
pub const SSY_MATURITY_YEARS: u32 = 21;
pub const SSY_DEPOSIT_YEARS: u32 = 15;
pub const SSY_MAX_OPENING_AGE: u32 = 10;

pub const NPS_EXIT_AGE: u32 = 60;
pub const NPS_MIN_ANNUITY_SHARE: f64 = 0.40;

#[derive(Debug, Clone, PartialEq)]
pub struct PpfInput {
    pub annual_investment: f64,
    pub tenure_years: u32,
    pub rate: f64,
}

pub fn ppf(input: &PpfInput) -> CalcResult<GrowthProjection> {
    ensure_range(
        "amount",
        input.annual_investment,
        PPF_MIN_DEPOSIT,
        PPF_MAX_DEPOSIT,
    )?;
    if !(PPF_MIN_TENURE..=PPF_MAX_TENURE).contains(&input.tenure_years) {
        return Err(CalcError::invalid(
            "tenure",
            format!("must be between {PPF_MIN_TENURE} and {PPF_MAX_TENURE} years"),
        ));
    }
    let plan = ContributionPlan::new(
        input.annual_investment,
        input.rate,
        input.tenure_years,
        ContributionMode::Yearly,
    )?;
    Ok(project_growth(&plan))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SsyInput {
    pub annual_investment: f64,
    pub girl_age: u32,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsyResult {
    pub maturity_age: u32,
    pub deposit_years: u32,
    #[serde(flatten)]
    pub projection: GrowthProjection,
}

pub fn ssy(input: &SsyInput) -> CalcResult<SsyResult> {
    ensure_range(
        "amount",
        input.annual_investment,
        SSY_MIN_DEPOSIT,
        SSY_MAX_DEPOSIT,
    )?;
    if input.girl_age > SSY_MAX_OPENING_AGE {
        return Err(CalcError::invalid(
            "girlAge",
            format!("must be <= {SSY_MAX_OPENING_AGE}"),
        ));
    }
    let plan = ContributionPlan::with_contribution_periods(
        input.annual_investment,
        input.rate,
        SSY_MATURITY_YEARS,
        SSY_DEPOSIT_YEARS,
        ContributionMode::Yearly,
    )?;
    Ok(SsyResult {
        maturity_age: input.girl_age + SSY_MATURITY_YEARS,
        deposit_years: SSY_DEPOSIT_YEARS,
        projection: project_growth(&plan),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpsInput {
    pub monthly_contribution: f64,
    pub current_age: u32,
    pub expected_return: f64,
    pub annuity_share: f64,
    pub annuity_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NpsResult {
    pub years_to_exit: u32,
    pub lump_sum: f64,
    pub annuity_corpus: f64,
    pub monthly_pension: f64,
    #[serde(flatten)]
    pub projection: GrowthProjection,
}

pub fn nps(input: &NpsInput) -> CalcResult<NpsResult> {
    if input.current_age < 18 || input.current_age >= NPS_EXIT_AGE {
        return Err(CalcError::invalid(
            "currentAge",
            format!("must be between 18 and {}", NPS_EXIT_AGE - 1),
        ));
    }
    if input.monthly_contribution <= 0.0 {
        return Err(CalcError::invalid("monthlyContribution", "must be > 0"));
    }
    ensure_range(
        "annuityShare",
        input.annuity_share,
        NPS_MIN_ANNUITY_SHARE,
        1.0,
    )?;
    ensure_range("annuityRate", input.annuity_rate, 0.0, 0.2)?;

    let years = NPS_EXIT_AGE - input.current_age;
    let plan = ContributionPlan::new(
        input.monthly_contribution,
        input.expected_return,
        years,
        ContributionMode::Monthly,
    )?;
    let projection = project_growth(&plan);
    let annuity_corpus = projection.maturity_value * input.annuity_share;
    Ok(NpsResult {
        years_to_exit: years,
        lump_sum: projection.maturity_value - annuity_corpus,
        annuity_corpus,
        monthly_pension: annuity_corpus * input.annuity_rate / 12.0,
        projection,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FdVsPpfInput {
    pub annual_investment: f64,
    pub tenure_years: u32,
    pub ppf_rate: f64,
    pub fd_rate: f64,
    pub tax_slab_rate: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsOption {
    Ppf,
    Fd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FdVsPpfResult {
    pub ppf: GrowthProjection,
    pub fd_after_tax: GrowthProjection,
    pub fd_effective_annual_rate: f64,
    pub fd_tax_paid: f64,
    pub difference: f64,
    pub better: SavingsOption,
}

pub fn fd_vs_ppf(input: &FdVsPpfInput) -> CalcResult<FdVsPpfResult> {
    ensure_range("taxSlabRate", input.tax_slab_rate, 0.0, 0.5)?;
    ensure_range("fdRate", input.fd_rate, 0.0, 0.2)?;
    if input.annual_investment <= 0.0 {
        return Err(CalcError::invalid("amount", "must be > 0"));
    }
    if !(1..=PPF_MAX_TENURE).contains(&input.tenure_years) {
        return Err(CalcError::invalid(
            "tenure",
            format!("must be between 1 and {PPF_MAX_TENURE} years"),
        ));
    }
    let ppf_plan = ContributionPlan::new(
        input.annual_investment,
        input.ppf_rate,
        input.tenure_years,
        ContributionMode::Yearly,
    )?;

    let gross_effective = compound(1.0, input.fd_rate, 4, 1.0) - 1.0;
    let net_effective = gross_effective * (1.0 - input.tax_slab_rate);
    let fd_plan = ContributionPlan::new(
        input.annual_investment,
        net_effective,
        input.tenure_years,
        ContributionMode::Yearly,
    )?;

    let ppf = project_growth(&ppf_plan);
    let fd_after_tax = project_growth(&fd_plan);
    let fd_tax_paid = if gross_effective > 0.0 {
        fd_after_tax
            .rows
            .iter()
            .map(|row| (row.opening_balance + row.contribution) * gross_effective)
            .sum::<f64>()
            * input.tax_slab_rate
    } else {
        0.0
    };
    let difference = ppf.maturity_value - fd_after_tax.maturity_value;
    Ok(FdVsPpfResult {
        better: if difference >= 0.0 {
            SavingsOption::Ppf
        } else {
            SavingsOption::Fd
        },
        fd_effective_annual_rate: gross_effective,
        fd_tax_paid,
        difference,
        ppf,
        fd_after_tax,
    })
}
