pub mod fixtures;

#[cfg(test)]
mod ingest_tests;
#[cfg(test)]
mod ws_tests;

#[cfg(test)]
mod ws_support;
