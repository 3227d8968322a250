pub mod money_market;
