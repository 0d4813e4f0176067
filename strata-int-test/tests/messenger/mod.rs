mod cleanup_test;
mod upgrade_test;
