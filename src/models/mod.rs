pub mod diary;
pub mod photo;

pub use diary::{Diary, DiaryRequest, DiaryText, GenerationMode};
pub use photo::PhotoRecord;
