mod otp_tests;
mod parser_tests;
mod resolve_tests;
mod support;
