mod chain_utils;
mod graph_tests;
mod message_store_tests;
