pub mod cli;
pub mod config;
pub mod data;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
