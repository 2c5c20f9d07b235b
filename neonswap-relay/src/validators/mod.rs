pub mod request_validator;
