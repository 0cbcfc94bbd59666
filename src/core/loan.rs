use super::types::{AmortizationRow, AmortizationSchedule, LoanTerms, PrepaymentComparison};

const BALANCE_EPSILON: f64 = 0.01;

pub fn emi(principal: f64, annual_rate: f64, tenure_months: u32) -> f64 {
    let n = tenure_months as f64;
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

// Prepayment comes off the balance before that month's interest.
pub fn amortize(terms: &LoanTerms) -> AmortizationSchedule {
    let monthly_rate = terms.annual_rate / 12.0;
    let installment = emi(terms.principal, terms.annual_rate, terms.tenure_months);
    let mut rows = Vec::with_capacity(terms.tenure_months as usize);
    let mut balance = terms.principal;
    let mut month = 0;

    while balance > BALANCE_EPSILON && month < terms.tenure_months {
        month += 1;
        let prepayment = match terms.prepayment {
            Some(p) if p.at_month == month => p.amount.min(balance),
            _ => 0.0,
        };
        balance -= prepayment;

        let interest = balance * monthly_rate;
        let principal = (installment - interest).min(balance).max(0.0);
        balance -= principal;
        rows.push(AmortizationRow {
            month,
            principal_paid: principal,
            prepayment,
            interest_paid: interest,
            total_payment: principal + interest,
            ending_balance: balance.max(0.0),
        });
    }

    let total_interest = rows.iter().map(|r| r.interest_paid).sum::<f64>();
    let total_paid = rows
        .iter()
        .map(|r| r.total_payment + r.prepayment)
        .sum::<f64>();
    AmortizationSchedule {
        emi: installment,
        months: rows.len() as u32,
        rows,
        total_interest,
        total_paid,
    }
}

pub fn compare_prepayment(terms: &LoanTerms) -> PrepaymentComparison {
    let baseline = amortize(&terms.without_prepayment());
    let Some(_) = terms.prepayment else {
        return PrepaymentComparison {
            baseline,
            with_prepayment: None,
            interest_saved: 0.0,
            months_saved: 0,
        };
    };
    let prepaid = amortize(terms);
    PrepaymentComparison {
        interest_saved: baseline.total_interest - prepaid.total_interest,
        months_saved: baseline.months.saturating_sub(prepaid.months),
        baseline,
        with_prepayment: Some(prepaid),
    }
}
