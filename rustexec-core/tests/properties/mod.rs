mod cmdline_tests;
mod compose_tests;
mod prompt_tests;
