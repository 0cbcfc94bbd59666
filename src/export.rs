use csv::Writer;

use crate::core::{
    AmortizationSchedule, CalcError, CalcResult, GrowthProjection, RetirementResult,
};

pub const GROWTH_HEADER: [&str; 5] = [
    "year",
    "opening_balance",
    "contribution",
    "interest",
    "closing_balance",
];

pub const LOAN_HEADER: [&str; 6] = [
    "month",
    "principal",
    "prepayment",
    "interest",
    "total_payment",
    "balance",
];

pub const RETIREMENT_HEADER: [&str; 6] = [
    "year",
    "age",
    "savings_value",
    "sip_invested",
    "sip_value",
    "total_value",
];

fn rupees(value: f64) -> String {
    format!("{}", value.round() as i64)
}

fn render<const N: usize>(
    header: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> CalcResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| CalcError::Export(e.to_string()))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| CalcError::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CalcError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CalcError::Export(e.to_string()))
}

pub fn growth_csv(projection: &GrowthProjection) -> CalcResult<String> {
    render(
        GROWTH_HEADER,
        projection.rows.iter().map(|row| {
            [
                row.year.to_string(),
                rupees(row.opening_balance),
                rupees(row.contribution),
                rupees(row.interest),
                rupees(row.closing_balance),
            ]
        }),
    )
}

pub fn amortization_csv(schedule: &AmortizationSchedule) -> CalcResult<String> {
    render(
        LOAN_HEADER,
        schedule.rows.iter().map(|row| {
            [
                row.month.to_string(),
                rupees(row.principal_paid),
                rupees(row.prepayment),
                rupees(row.interest_paid),
                rupees(row.total_payment),
                rupees(row.ending_balance),
            ]
        }),
    )
}

pub fn retirement_csv(result: &RetirementResult) -> CalcResult<String> {
    render(
        RETIREMENT_HEADER,
        result.projection.iter().map(|row| {
            [
                row.year.to_string(),
                row.age.to_string(),
                rupees(row.savings_value),
                rupees(row.sip_invested),
                rupees(row.sip_value),
                rupees(row.total_value),
            ]
        }),
    )
}
