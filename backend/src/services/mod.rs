//! Business logic services for the Stockpile Management Platform

pub mod archive;
pub mod history;
pub mod review;
pub mod supply;
pub mod team;

pub use archive::ArchiveService;
pub use history::HistoryService;
pub use review::ReviewService;
pub use supply::SupplyService;
pub use team::TeamService;
