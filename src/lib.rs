//! mvtgen: describe an A/B test in plain language, get a JSON configuration.
//!
//! The library holds everything except argument parsing: the JSON validator,
//! the workflow state machine and controller, the generation service client,
//! and the supporting config, activity log, clipboard and rendering pieces.

pub mod activity;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod ingest;
pub mod render;
pub mod service;
pub mod shell;
pub mod validator;
pub mod workflow;

pub use error::{ErrorKind, RemoteError, WorkflowError};
pub use workflow::{AppState, Workflow};

/// Example descriptions offered to new users.
pub const EXAMPLE_PROMPTS: [&str; 3] = [
    "Create an A/B test for button color - 50% users see red button, 50% see blue button. Target mobile users in the US. Track click-through rate.",
    "Set up a multivariate test with 3 variants: control (current design), variant A (larger font), variant B (different layout). Split traffic 40/30/30. Target all users.",
    "Create a test for pricing page - test 3 different price points ($9.99, $14.99, $19.99) with equal distribution. Track conversion rate and revenue.",
];
