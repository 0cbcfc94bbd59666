use super::error::{CalcError, CalcResult};
use super::types::{AgeBand, Regime, TaxComparison, TaxResult, TaxScenario};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slab {
    /// Inclusive upper bound of the band; `None` for the top band.
    pub upper_limit: Option<f64>,
    pub rate: f64,
}

impl Slab {
    pub const fn upto(upper_limit: f64, rate: f64) -> Self {
        Self {
            upper_limit: Some(upper_limit),
            rate,
        }
    }

    pub const fn above(rate: f64) -> Self {
        Self {
            upper_limit: None,
            rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlabTable(Vec<Slab>);

impl SlabTable {
    pub fn new(slabs: Vec<Slab>) -> CalcResult<Self> {
        let Some(last) = slabs.last() else {
            return Err(CalcError::InvalidSlabs("table is empty".to_string()));
        };
        if last.upper_limit.is_some() {
            return Err(CalcError::InvalidSlabs(
                "top band must be unbounded".to_string(),
            ));
        }
        let mut previous = 0.0;
        for (idx, slab) in slabs.iter().enumerate() {
            if !(0.0..=1.0).contains(&slab.rate) {
                return Err(CalcError::InvalidSlabs(format!(
                    "band {idx} rate {} outside 0..=1",
                    slab.rate
                )));
            }
            match slab.upper_limit {
                Some(limit) if limit <= previous => {
                    return Err(CalcError::InvalidSlabs(format!(
                        "band {idx} limit {limit} does not exceed {previous}"
                    )));
                }
                Some(limit) => previous = limit,
                None if idx + 1 != slabs.len() => {
                    return Err(CalcError::InvalidSlabs(format!(
                        "unbounded band {idx} is not last"
                    )));
                }
                None => {}
            }
        }
        Ok(Self(slabs))
    }

    pub fn tax_on(&self, income: f64) -> f64 {
        let mut lower = 0.0;
        let mut tax = 0.0;
        for slab in &self.0 {
            if income <= lower {
                break;
            }
            let upper = slab.upper_limit.unwrap_or(f64::INFINITY);
            tax += (income.min(upper) - lower) * slab.rate;
            lower = upper;
        }
        tax
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeductionCaps {
    pub section_80c: f64,
    pub section_80d: f64,
    pub section_80d_senior: f64,
    pub section_80ccd_1b: f64,
    pub section_80tta: f64,
    pub section_80ttb_senior: f64,
    pub home_loan_interest: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxRules {
    pub old_below_60: SlabTable,
    pub old_senior: SlabTable,
    pub old_super_senior: SlabTable,
    pub new_regime: SlabTable,
    pub standard_deduction_old: f64,
    pub standard_deduction_new: f64,
    pub rebate_limit_old: f64,
    pub rebate_limit_new: f64,
    pub cess_rate: f64,
    pub caps: DeductionCaps,
}

impl TaxRules {
    pub fn fy2023_24() -> CalcResult<Self> {
        Ok(Self {
            old_below_60: SlabTable::new(vec![
                Slab::upto(250_000.0, 0.0),
                Slab::upto(500_000.0, 0.05),
                Slab::upto(1_000_000.0, 0.20),
                Slab::above(0.30),
            ])?,
            old_senior: SlabTable::new(vec![
                Slab::upto(300_000.0, 0.0),
                Slab::upto(500_000.0, 0.05),
                Slab::upto(1_000_000.0, 0.20),
                Slab::above(0.30),
            ])?,
            old_super_senior: SlabTable::new(vec![
                Slab::upto(500_000.0, 0.0),
                Slab::upto(1_000_000.0, 0.20),
                Slab::above(0.30),
            ])?,
            new_regime: SlabTable::new(vec![
                Slab::upto(300_000.0, 0.0),
                Slab::upto(600_000.0, 0.05),
                Slab::upto(900_000.0, 0.10),
                Slab::upto(1_200_000.0, 0.15),
                Slab::upto(1_500_000.0, 0.20),
                Slab::above(0.30),
            ])?,
            standard_deduction_old: 50_000.0,
            standard_deduction_new: 50_000.0,
            rebate_limit_old: 500_000.0,
            rebate_limit_new: 700_000.0,
            cess_rate: 0.04,
            caps: DeductionCaps {
                section_80c: 150_000.0,
                section_80d: 25_000.0,
                section_80d_senior: 50_000.0,
                section_80ccd_1b: 50_000.0,
                section_80tta: 10_000.0,
                section_80ttb_senior: 50_000.0,
                home_loan_interest: 200_000.0,
            },
        })
    }

    fn old_table(&self, band: AgeBand) -> &SlabTable {
        match band {
            AgeBand::Below60 => &self.old_below_60,
            AgeBand::Senior => &self.old_senior,
            AgeBand::SuperSenior => &self.old_super_senior,
        }
    }
}

/// Least of actual HRA, rent over 10% of basic, and 50%/40% of basic.
pub fn hra_exemption(scenario: &TaxScenario) -> f64 {
    let hra = &scenario.hra;
    let salary_share = if hra.metro { 0.50 } else { 0.40 } * hra.basic_salary;
    let rent_excess = hra.rent_paid - 0.10 * hra.basic_salary;
    hra.hra_received.min(rent_excess).min(salary_share).max(0.0)
}

fn old_regime_deductions(scenario: &TaxScenario, rules: &TaxRules, hra: f64) -> f64 {
    let d = &scenario.deductions;
    let caps = &rules.caps;
    let senior = scenario.age_band.is_senior();
    let cap_80d = if senior {
        caps.section_80d_senior
    } else {
        caps.section_80d
    };
    let cap_interest = if senior {
        caps.section_80ttb_senior
    } else {
        caps.section_80tta
    };
    rules.standard_deduction_old
        + hra
        + d.section_80c.min(caps.section_80c)
        + d.section_80d.min(cap_80d)
        + d.section_80ccd_1b.min(caps.section_80ccd_1b)
        + d.section_80tta.min(cap_interest)
        + d.home_loan_interest.min(caps.home_loan_interest)
        + d.lta
}

fn finish(
    regime: Regime,
    gross: f64,
    deductions: f64,
    table: &SlabTable,
    rebate_limit: f64,
    cess_rate: f64,
) -> TaxResult {
    let taxable_income = (gross - deductions).max(0.0);
    let tax_before_rebate = table.tax_on(taxable_income);
    let rebate = if taxable_income <= rebate_limit {
        tax_before_rebate
    } else {
        0.0
    };
    let after_rebate = tax_before_rebate - rebate;
    let cess = after_rebate * cess_rate;
    let total_tax = after_rebate + cess;
    TaxResult {
        regime,
        taxable_income,
        total_deductions: deductions.min(gross),
        tax_before_rebate,
        rebate,
        cess,
        total_tax,
        effective_rate: if gross > 0.0 { total_tax / gross } else { 0.0 },
    }
}

pub fn old_regime_tax(scenario: &TaxScenario, rules: &TaxRules) -> TaxResult {
    let gross = scenario.gross_salary + scenario.other_income;
    let deductions = old_regime_deductions(scenario, rules, hra_exemption(scenario));
    finish(
        Regime::Old,
        gross,
        deductions,
        rules.old_table(scenario.age_band),
        rules.rebate_limit_old,
        rules.cess_rate,
    )
}

pub fn new_regime_tax(scenario: &TaxScenario, rules: &TaxRules) -> TaxResult {
    let gross = scenario.gross_salary + scenario.other_income;
    finish(
        Regime::New,
        gross,
        rules.standard_deduction_new,
        &rules.new_regime,
        rules.rebate_limit_new,
        rules.cess_rate,
    )
}

/// Side-by-side liability; ties go to the new regime, the statutory default.
pub fn compare_regimes(scenario: &TaxScenario, rules: &TaxRules) -> TaxComparison {
    let old_regime = old_regime_tax(scenario, rules);
    let new_regime = new_regime_tax(scenario, rules);
    let better_regime = if old_regime.total_tax < new_regime.total_tax {
        Regime::Old
    } else {
        Regime::New
    };
    TaxComparison {
        hra_exemption: hra_exemption(scenario),
        savings: (old_regime.total_tax - new_regime.total_tax).abs(),
        old_regime,
        new_regime,
        better_regime,
    }
}
