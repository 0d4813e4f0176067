mod concurrency_test;
mod sqlite_store_test;
