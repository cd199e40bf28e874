pub mod acceptance_service;
pub mod bonus_resolver;
pub mod commitment_filter;
pub mod earnings_calculator;
pub mod earnings_optimizer;
pub mod earnings_service;
pub mod settings_service;
pub mod span_utils;
