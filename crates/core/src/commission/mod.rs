//! Partner commission distribution.

pub mod calculator;
pub mod error;

#[cfg(test)]
mod calculator_props;

pub use calculator::{
    BPS_SCALE, CommissionCalculator, CommissionDistribution, CommissionPolicy, CommissionResult,
    RiderPremium,
};
pub use error::CommissionError;
