pub mod amm_actions;
pub mod crypto_invariant;
pub mod errors;
pub mod fees_utils;
pub mod math_utils;
pub mod pool_data;
pub mod price_oracle;
pub mod repegging_utils;

#[cfg(test)]
mod generators;
