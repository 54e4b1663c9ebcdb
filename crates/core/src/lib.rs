//! Game logic for a spoken "I Spy" robot: turn-taking over a listen
//! mailbox, intent recognition, the LLM-backed oracle and the two match
//! modes, kept free of any concrete robot or transport.

pub mod controller;
pub mod error;
pub mod hints;
pub mod intent;
pub mod listen;
pub mod llm_client;
pub mod llm_oracle;
pub mod object;
pub mod oracle;
pub mod reprompt;
pub mod round;
pub mod scanner;
pub mod selection;
pub mod session;
pub mod settings;
pub mod speech;
pub mod turn;

#[cfg(test)]
mod testing;
