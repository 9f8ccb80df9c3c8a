mod integration_tests;
mod text_parser_unit_tests;
