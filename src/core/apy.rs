use serde::Serialize;

use super::error::{CalcError, CalcResult};

pub const APY_MIN_ENTRY_AGE: u32 = 18;
pub const APY_MAX_ENTRY_AGE: u32 = 39;
pub const APY_EXIT_AGE: u32 = 60;
pub const APY_PENSION_STEP: u32 = 1_000;
pub const APY_CORPUS_PER_STEP: f64 = 170_000.0;

// Monthly contribution by entry age (18..=39) for a pension of 1k..=5k.
const CHART: [[u32; 5]; 22] = [
    [42, 84, 126, 168, 210],
    [46, 92, 138, 183, 228],
    [50, 100, 150, 198, 248],
    [54, 108, 162, 215, 269],
    [59, 117, 177, 234, 292],
    [64, 127, 192, 254, 318],
    [70, 139, 208, 277, 346],
    [76, 151, 226, 301, 376],
    [82, 164, 246, 327, 409],
    [90, 178, 268, 356, 446],
    [97, 194, 292, 388, 485],
    [106, 212, 318, 423, 529],
    [116, 231, 347, 462, 577],
    [126, 252, 379, 504, 630],
    [138, 276, 414, 551, 689],
    [151, 302, 453, 602, 752],
    [165, 330, 495, 659, 824],
    [181, 362, 543, 722, 902],
    [198, 396, 594, 792, 990],
    [218, 436, 654, 870, 1087],
    [240, 480, 720, 957, 1196],
    [264, 528, 792, 1054, 1318],
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApyResult {
    pub entry_age: u32,
    pub monthly_pension: u32,
    pub monthly_contribution: f64,
    pub contribution_years: u32,
    pub total_contribution: f64,
    pub nominee_corpus: f64,
}

pub fn apy(entry_age: u32, monthly_pension: u32) -> CalcResult<ApyResult> {
    if !(APY_MIN_ENTRY_AGE..=APY_MAX_ENTRY_AGE).contains(&entry_age) {
        return Err(CalcError::invalid(
            "age",
            format!("must be between {APY_MIN_ENTRY_AGE} and {APY_MAX_ENTRY_AGE}"),
        ));
    }
    if monthly_pension % APY_PENSION_STEP != 0
        || !(1..=5).contains(&(monthly_pension / APY_PENSION_STEP))
    {
        return Err(CalcError::invalid(
            "pension",
            "must be one of 1000, 2000, 3000, 4000, 5000",
        ));
    }
    let row = (entry_age - APY_MIN_ENTRY_AGE) as usize;
    let col = (monthly_pension / APY_PENSION_STEP - 1) as usize;
    let monthly_contribution = CHART[row][col] as f64;
    let contribution_years = APY_EXIT_AGE - entry_age;
    Ok(ApyResult {
        entry_age,
        monthly_pension,
        monthly_contribution,
        contribution_years,
        total_contribution: monthly_contribution * 12.0 * contribution_years as f64,
        nominee_corpus: APY_CORPUS_PER_STEP * (monthly_pension / APY_PENSION_STEP) as f64,
    })
}
