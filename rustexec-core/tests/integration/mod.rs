mod config_tests;
mod ssh_execution_tests;
mod winrm_lifecycle_tests;
