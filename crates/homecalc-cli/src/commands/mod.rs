pub mod loan;
pub mod payroll;
pub mod property;
pub mod savings;
