pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod schedule;

#[cfg(test)]
mod tests;
