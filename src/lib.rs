#![doc(html_root_url = "https://docs.rs/admin-shell/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod config;
pub mod coordinator;
pub mod envelope;
pub mod form;
pub mod history;
pub mod intercept;
pub mod notify;
pub mod patch;
pub mod shell;
pub mod transport;
pub mod web;

#[cfg(test)]
mod testing;

pub use config::ShellConfig;
pub use shell::AppShell;
