mod draft_store_tests;
mod lifecycle_tests;
mod profile_document_tests;
mod rate_limiter_tests;
