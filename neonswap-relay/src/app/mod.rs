pub mod balance_service;
pub mod endpoint_selector;
pub mod quote_service;
pub mod swap_service;

#[cfg(test)]
pub mod test_support;
