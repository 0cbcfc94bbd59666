mod apy;
mod error;
mod growth;
mod loan;
mod overlap;
mod retirement;
mod schemes;
mod tax;
mod types;

pub use apy::{ApyResult, apy};
pub use error::{CalcError, CalcResult};
pub use growth::{compound, project_growth};
pub use loan::{amortize, compare_prepayment, emi};
pub use overlap::{MAX_FUNDS, MIN_FUNDS, compute_overlap, parse_holdings};
pub use retirement::{monthly_sip_for, required_corpus, size_retirement};
pub use schemes::{
    FdVsPpfInput, FdVsPpfResult, NpsInput, NpsResult, PpfInput, SavingsOption, SsyInput,
    SsyResult, fd_vs_ppf, nps, ppf, ssy,
};
pub use tax::{
    DeductionCaps, Slab, SlabTable, TaxRules, compare_regimes, hra_exemption, new_regime_tax,
    old_regime_tax,
};
pub use types::{
    AgeBand, AmortizationRow, AmortizationSchedule, CommonHolding, ContributionMode,
    ContributionPlan, Deductions, Fund, FundHolding, GrowthProjection, HraDetails,
    LIFE_EXPECTANCY_AGE, LoanTerms, OverlapReport, PairwiseOverlap, Prepayment,
    PrepaymentComparison, Regime, RetirementPlan, RetirementResult, RetirementYear,
    SectorOverlap, TaxComparison, TaxResult, TaxScenario, YearlyLedgerRow,
};
