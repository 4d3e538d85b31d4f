// file: src/models/mod.rs

pub mod class;
pub mod notice;
pub mod page;
pub mod refresh;

pub use class::{min_age_from_grade, stable_class_id, ClassRecord};
pub use notice::NoticeRecord;
pub use page::OneColumnRecord;
pub use refresh::RefreshResult;
