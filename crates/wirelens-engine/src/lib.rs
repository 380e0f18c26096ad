pub mod codec;
pub mod decision;
pub mod describe;
pub mod gallery;
pub mod gateway;
pub mod inspect;
pub mod prompt;
pub mod staging;

pub use codec::EncodedImage;
pub use decision::parse_verdict;
pub use describe::adapt_description;
pub use gallery::{GalleryCache, HttpRoomDirectory, ReferenceGallery, RoomDirectory};
pub use gateway::{CompletionOptions, InferenceGateway, OpenAiGateway};
pub use inspect::run_inspection;
pub use prompt::{build_inspection_request, ReasoningRequest};
pub use staging::StagedSubject;

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}
