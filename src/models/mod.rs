mod story;

pub use story::{ScrapedStory, Story, StoryCandidate};
