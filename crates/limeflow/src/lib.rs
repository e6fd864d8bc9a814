//! LimeFlow: a slide deck that lives in a spreadsheet.
//!
//! The library is the sync core: the [`deck`] model, bounded undo [`history`],
//! share-token [`link`] codec, the remote [`store`] client and the
//! [`session`] controller that ties them together. The `limeflow` binary puts a
//! terminal editor and presenter on top.

pub mod ai;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deck;
pub mod history;
pub mod link;
pub mod logging;
pub mod render;
pub mod session;
pub mod store;
pub mod theme;
