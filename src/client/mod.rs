pub mod trivia_client;
pub mod trivia_client_error;
