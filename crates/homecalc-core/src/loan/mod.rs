pub mod amortization;
pub mod payment;
