mod atomicity_test;
mod ladder_test;
