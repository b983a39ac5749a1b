pub mod asset;
pub mod playlist;
pub mod submission;
pub mod track;
pub mod user;
